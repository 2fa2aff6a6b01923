//! Test Helpers Module for JSON-RPC Integration Tests
//!
//! Shared fixtures: a server bound to an ephemeral port, and a raw
//! line-oriented connection for exercising malformed input that the typed
//! `Client` cannot produce.

use std::net::SocketAddr;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use turul_jsonrpc2::Server;

/// Serve `server` on `127.0.0.1:0` in a background task.
///
/// The returned handle can be aborted to stop accepting connections.
pub async fn spawn_server(server: Server) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        server.serve(listener).await.expect("serve");
    });

    (addr, handle)
}

/// A connection that writes raw text and reads back one JSON value per line
#[allow(dead_code)]
pub struct RawConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl RawConnection {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .expect("connect to server");
        let (read, write) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    pub async fn send(&mut self, text: &str) {
        self.writer
            .write_all(text.as_bytes())
            .await
            .expect("write to server");
    }

    /// Next response line, or `None` once the server closed the connection
    pub async fn recv(&mut self) -> Option<Value> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await.expect("read line");
        if read == 0 {
            return None;
        }
        Some(serde_json::from_str(&line).expect("response is valid JSON"))
    }

    pub async fn shutdown(mut self) {
        let _ = self.writer.shutdown().await;
    }
}

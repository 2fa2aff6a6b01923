//! Minimal blocking-style client: one request, one response, in order

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::debug;
use uuid::Uuid;

use crate::codec::JsonCodec;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// JSON-RPC client over a single connection.
///
/// Responses are assumed to arrive in request order; ids are not matched.
pub struct Client<S = TcpStream> {
    framed: Framed<S, JsonCodec<Response>>,
}

impl Client<TcpStream> {
    /// Open a TCP connection to `addr`
    pub async fn dial(addr: impl ToSocketAddrs) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        if let Ok(peer) = stream.peer_addr() {
            debug!("Connected to {}", peer);
        }
        Ok(Self::from_stream(stream))
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.framed.get_ref().peer_addr()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.framed.get_ref().local_addr()
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream
    pub fn from_stream(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, JsonCodec::new()),
        }
    }

    /// Call `Class.Method` with positional parameters and wait for the response.
    ///
    /// A fresh UUID is used as the request id. Application-level failures are
    /// returned inside the `Response`; only transport failures are errors.
    pub async fn call(&mut self, method: &str, params: Vec<Value>) -> ClientResult<Response> {
        let request = Request::new(Uuid::new_v4().to_string(), method, params);
        debug!("Calling {} (id: {})", request.method, request.id);
        self.framed.send(request).await?;

        match self.framed.next().await {
            Some(Ok(Ok(response))) => Ok(response),
            Some(Ok(Err(err))) => Err(ClientError::InvalidResponse(err)),
            Some(Err(err)) => Err(err.into()),
            None => Err(ClientError::ConnectionClosed),
        }
    }

    /// Consume the client, returning the underlying stream
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    #[tokio::test]
    async fn test_call_sends_request_with_fresh_id() {
        let (client_io, server_io) = duplex(4096);
        let mut client = Client::from_stream(client_io);

        let server = tokio::spawn(async move {
            let mut reader = BufReader::new(server_io);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let request: Request = serde_json::from_str(&line).unwrap();

            let response = Response::success(request.id.clone(), Some(json!(84)));
            let mut body = serde_json::to_vec(&response).unwrap();
            body.push(b'\n');
            reader.get_mut().write_all(&body).await.unwrap();
            request
        });

        let response = client.call("Class.ArgMethod", vec![json!(42)]).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(request.method, "Class.ArgMethod");
        assert_eq!(request.params, vec![json!(42)]);
        assert!(!request.id.is_empty());
        assert!(Uuid::parse_str(request.id.as_str().unwrap()).is_ok());
        assert_eq!(response.id, request.id);
        assert_eq!(response.result, Some(json!(84)));
    }

    #[tokio::test]
    async fn test_ids_are_unique_per_call() {
        let (client_io, server_io) = duplex(4096);
        let mut client = Client::from_stream(client_io);

        let server = tokio::spawn(async move {
            let mut reader = BufReader::new(server_io);
            let mut ids = Vec::new();
            for _ in 0..2 {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let request: Request = serde_json::from_str(&line).unwrap();
                let response = Response::success(request.id.clone(), None);
                let mut body = serde_json::to_vec(&response).unwrap();
                body.push(b'\n');
                reader.get_mut().write_all(&body).await.unwrap();
                ids.push(request.id);
            }
            ids
        });

        client.call("Class.Method", vec![]).await.unwrap();
        client.call("Class.Method", vec![]).await.unwrap();
        let ids: Vec<RequestId> = server.await.unwrap();
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn test_connection_closed_before_response() {
        let (client_io, server_io) = duplex(4096);
        let mut client = Client::from_stream(client_io);

        let server = tokio::spawn(async move {
            let mut reader = BufReader::new(server_io);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
        });

        let err = client.call("Class.Method", vec![]).await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_invalid_response() {
        let (client_io, server_io) = duplex(4096);
        let mut client = Client::from_stream(client_io);

        tokio::spawn(async move {
            let mut reader = BufReader::new(server_io);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            reader.get_mut().write_all(b"{\"error\": {\"code\": 1}}\n").await.unwrap();
            // keep the stream open until the client has read the line
            let _ = reader.read_line(&mut line).await;
        });

        let err = client.call("Class.Method", vec![]).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_dial_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Client::dial(addr).await;
        assert!(matches!(result, Err(ClientError::Connect(_))));
    }
}

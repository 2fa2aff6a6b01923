//! Per-connection request loop

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, error, warn};

use crate::codec::JsonCodec;
use crate::dispatch::execute;
use crate::error::ErrorObject;
use crate::registry::RegistrySnapshot;
use crate::request::Request;
use crate::response::Response;
use crate::server::WriteFailurePolicy;
use crate::types::RequestId;

/// Drives a single JSON-RPC connection.
///
/// The handler owns the stream for its whole lifetime: it decodes one request,
/// dispatches it, writes the response, and only then reads the next request.
/// The stream is closed when [`ConnectionHandler::run`] returns.
pub struct ConnectionHandler<S> {
    framed: Framed<S, JsonCodec<Value>>,
    registry: RegistrySnapshot,
    write_failure: WriteFailurePolicy,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, registry: RegistrySnapshot) -> Self {
        Self::with_codec(stream, registry, JsonCodec::new())
    }

    pub fn with_codec(stream: S, registry: RegistrySnapshot, codec: JsonCodec<Value>) -> Self {
        Self {
            framed: Framed::new(stream, codec),
            registry,
            write_failure: WriteFailurePolicy::default(),
        }
    }

    pub fn write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }

    /// Serve requests until the peer closes the connection or reading fails
    pub async fn run(mut self) {
        while let Some(frame) = self.framed.next().await {
            let response = match frame {
                Ok(Ok(value)) => match parse_request(value) {
                    Ok(request) => {
                        debug!("Dispatching {} (id: {})", request.method, request.id);
                        execute(&self.registry, request)
                    }
                    Err(response) => response,
                },
                Ok(Err(err)) => {
                    warn!("Unable to parse request: {}", err);
                    Response::parse_error()
                }
                Err(err) => {
                    error!("Connection read failed: {}", err);
                    break;
                }
            };

            if let Err(err) = self.framed.send(response).await {
                warn!("Failed to write response: {}", err);
                if self.write_failure == WriteFailurePolicy::Close {
                    break;
                }
            }
        }
        debug!("Connection closed");
    }
}

/// Turn a decoded JSON value into a request.
///
/// Anything but an object is a parse error. An object that does not fit the
/// request envelope is an invalid request answered with its own `id`.
fn parse_request(value: Value) -> Result<Request, Response> {
    if !value.is_object() {
        warn!("Unable to parse request: expected a JSON object");
        return Err(Response::parse_error());
    }

    let id = value
        .get("id")
        .and_then(|id| RequestId::deserialize(id).ok())
        .unwrap_or_default();

    serde_json::from_value(value).map_err(|err| {
        warn!("Invalid request (id: {}): {}", id, err);
        Response::error(id, ErrorObject::invalid_request(err))
    })
}

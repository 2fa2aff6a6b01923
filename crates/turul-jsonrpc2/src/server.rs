//! TCP listener that serves JSON-RPC connections

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::codec::{DEFAULT_MAX_MESSAGE_SIZE, JsonCodec};
use crate::error::ServerError;
use crate::handler::ConnectionHandler;
use crate::registry::{MethodRegistry, RpcClass};

/// What a connection does when writing a response fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Log the failure and keep reading requests
    #[default]
    LogAndContinue,
    /// Log the failure and close the connection
    Close,
}

/// Configuration for the JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host name or address the listener binds to
    pub host: String,
    /// Largest single message buffered before the connection is dropped
    pub max_message_size: usize,
    /// Behaviour when a response cannot be written
    pub write_failure: WriteFailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            write_failure: WriteFailurePolicy::LogAndContinue,
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_write_failure(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }
}

/// JSON-RPC server: a class registry plus the listener that serves it.
///
/// Cloning is cheap and clones share the registry, so a clone can keep
/// registering classes while another clone is listening. Connections pick up
/// the registry as it is when they are accepted.
#[derive(Debug, Clone, Default)]
pub struct Server {
    config: ServerConfig,
    registry: Arc<MethodRegistry>,
}

impl Server {
    /// Create a server with an empty registry and default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(MethodRegistry::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Expose the methods of `class` under its class name.
    ///
    /// The value only selects the type: every call runs on a fresh
    /// `Default` instance. Registering the same name again replaces the
    /// previous class.
    pub fn register<C: RpcClass>(&self, _class: C) {
        self.registry.register::<C>();
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Names of the registered classes, sorted
    pub fn registered_classes(&self) -> Vec<String> {
        self.registry.class_names()
    }

    /// Bind `host:port` and serve connections forever.
    ///
    /// Only a bind failure is returned; errors on individual connections are
    /// logged and never stop the server.
    pub async fn listen(&self, port: u16) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("JSON-RPC server listening on {}", addr);
        self.serve(listener).await
    }

    /// Serve connections accepted from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(local) = listener.local_addr() {
            debug!(
                "Serving on {} with classes {:?}",
                local,
                self.registered_classes()
            );
        }

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("Failed to accept connection: {}", err);
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let handler = ConnectionHandler::with_codec(
                stream,
                self.registry.snapshot(),
                JsonCodec::with_max_message_size(self.config.max_message_size),
            )
            .write_failure_policy(self.config.write_failure);

            tokio::spawn(
                handler
                    .run()
                    .instrument(info_span!("connection", peer = %peer)),
            );
        }
    }
}

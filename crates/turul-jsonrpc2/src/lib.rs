//! # JSON-RPC 2.0 over TCP
//!
//! A small JSON-RPC 2.0 server and client. Requests name a registered class
//! and one of its methods as `"Class.Method"` and pass positional parameters;
//! the server dispatches each call on a fresh instance of the class and
//! writes the result, or a structured error, back on the same connection.
//!
//! ## Features
//! - `#[rpc_class]` attribute macro (default `derive` feature) generating the
//!   dispatch adapter for an `impl` block
//! - Per-parameter type checking before invocation, mapped to `Invalid params`
//! - Panics and method failures reported as `Internal error`
//! - One task per connection, requests on a connection handled in order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turul_jsonrpc2::{Server, rpc_class};
//!
//! #[derive(Default)]
//! pub struct Class;
//!
//! #[rpc_class]
//! impl Class {
//!     pub fn return_string(&self) -> String {
//!         "Hello, World!".to_string()
//!     }
//! }
//!
//! let server = Server::new();
//! server.register(Class);
//! server.listen(6342).await?;
//! ```

pub mod client;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;
pub mod types;

// Re-export main types
pub use client::{Client, ClientResult};
pub use codec::JsonCodec;
pub use dispatch::execute;
pub use error::{ClientError, CodecError, ErrorCode, ErrorObject, InvokeError, ServerError};
pub use handler::ConnectionHandler;
pub use registry::{MethodRegistry, RpcClass, RpcObject};
pub use request::Request;
pub use response::Response;
pub use server::{Server, ServerConfig, WriteFailurePolicy};
pub use types::{JsonRpcVersion, RequestId};

#[cfg(feature = "derive")]
pub use turul_jsonrpc2_derive::rpc_class;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Items referenced by code generated from `#[rpc_class]`
#[doc(hidden)]
pub mod __private {
    pub use crate::error::InvokeError;
    pub use crate::registry::{RpcClass, RpcObject, bind_param, encode_result};
    pub use serde_json::Value;
}

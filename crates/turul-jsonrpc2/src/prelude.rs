//! # JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use turul_jsonrpc2::prelude::*;
//! ```

pub use crate::client::{Client, ClientResult};
pub use crate::error::{ClientError, ErrorCode, ErrorObject, InvokeError, ServerError};
pub use crate::registry::{RpcClass, RpcObject};
pub use crate::request::Request;
pub use crate::response::Response;
pub use crate::server::{Server, ServerConfig, WriteFailurePolicy};
pub use crate::types::RequestId;

#[cfg(feature = "derive")]
pub use crate::rpc_class;

// Standard error codes
pub use crate::error_codes::*;

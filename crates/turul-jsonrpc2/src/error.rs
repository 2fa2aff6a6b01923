use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// JSON-RPC error codes. The set is closed: these are the codes the
/// JSON-RPC 2.0 specification reserves for protocol-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            ErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            ErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            ErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            crate::error_codes::PARSE_ERROR => Some(ErrorCode::ParseError),
            crate::error_codes::INVALID_REQUEST => Some(ErrorCode::InvalidRequest),
            crate::error_codes::METHOD_NOT_FOUND => Some(ErrorCode::MethodNotFound),
            crate::error_codes::INVALID_PARAMS => Some(ErrorCode::InvalidParams),
            crate::error_codes::INTERNAL_ERROR => Some(ErrorCode::InternalError),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i64::deserialize(deserializer)?;
        ErrorCode::from_code(code).ok_or_else(|| {
            serde::de::Error::custom(format!("Unknown JSON-RPC error code: {}", code))
        })
    }
}

/// JSON-RPC error object carried in the `error` member of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError, "unable to parse JSON request body")
    }

    pub fn invalid_request(detail: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidRequest, format!("invalid request: {}", detail))
    }

    pub fn malformed_call(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("call string must be of form class.method: {}", method),
        )
    }

    pub fn unregistered_object(class: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("unregistered object: {}", class),
        )
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("unknown method: {}", method))
    }

    pub fn arity_mismatch() -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            "given parameters do not match desired method",
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ErrorObject {}

/// Failure raised by an `RpcObject` while binding arguments or running a method
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid parameter {index} for {method}: {reason}")]
    InvalidParam {
        method: String,
        index: usize,
        reason: String,
    },

    #[error("{0}")]
    Failed(String),

    #[error("unable to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

impl InvokeError {
    pub fn failed(message: impl fmt::Display) -> Self {
        InvokeError::Failed(message.to_string())
    }

    /// Map onto the wire error reported to the caller
    pub fn to_error_object(&self) -> ErrorObject {
        match self {
            InvokeError::UnknownMethod(method) => ErrorObject::unknown_method(method),
            InvokeError::InvalidParam { .. } => ErrorObject::invalid_params(self.to_string()),
            InvokeError::Failed(_) | InvokeError::Encode(_) => {
                ErrorObject::internal_error(self.to_string())
            }
        }
    }
}

/// Transport-level errors of the JSON stream codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message exceeds maximum size of {limit} bytes")]
    MessageTooLarge { limit: usize },
}

/// Errors that stop a server from serving
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors seen by a client; application failures arrive inside the `Response`
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    #[error("transport error: {0}")]
    Codec(#[from] CodecError),

    #[error("connection closed before a response was received")]
    ConnectionClosed,

    #[error("invalid response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

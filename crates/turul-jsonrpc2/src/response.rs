use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;
use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC response.
///
/// A failed call carries `error`; a successful call carries `result` when the
/// method produced a value and neither member when it did not. `id` is always
/// written, as the empty string when the request could not be correlated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "jsonrpc", default)]
    pub version: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    #[serde(default)]
    pub id: RequestId,
}

impl Response {
    pub fn success(id: RequestId, result: Option<Value>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            error: None,
            id,
        }
    }

    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Response to input that could not be decoded into a request
    pub fn parse_error() -> Self {
        Self::error(RequestId::default(), ErrorObject::parse_error())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Consume the response, yielding the result or the error object
    pub fn into_result(self) -> Result<Option<Value>, ErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

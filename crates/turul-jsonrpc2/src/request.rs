use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request calling `Class.Method` with positional parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "jsonrpc", default)]
    pub version: JsonRpcVersion,
    #[serde(default)]
    pub method: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub params: Vec<Value>,
    #[serde(default, skip_serializing_if = "RequestId::is_empty")]
    pub id: RequestId,
}

impl Request {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: id.into(),
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self::new(id, method, Vec::new())
    }

    /// Split the call string into `(class, method)`.
    ///
    /// Returns `None` unless the string has at least two `.`-separated
    /// fields; anything past the second field is ignored.
    pub fn call_target(&self) -> Option<(&str, &str)> {
        let mut fields = self.method.split('.');
        match (fields.next(), fields.next()) {
            (Some(class), Some(method)) => Some((class, method)),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

//! The node's JSON-RPC envelope.
//!
//! Unlike stock JSON-RPC 2.0 the node reports failures as a plain error
//! string next to the result, and identifies requests by string id.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An application-level error string returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("node error: {0}")]
pub struct RpcError(pub String);

/// A JSON-RPC request
#[derive(Serialize, Deserialize, Debug)]
pub struct Request<'a, T> {
    jsonrpc: &'a str,
    id: &'a str,
    method: &'a str,
    params: T,
}

impl<'a, T> Request<'a, T> {
    /// Creates a new JSON-RPC request
    pub fn new(id: &'a str, method: &'a str, params: T) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

/// A JSON-RPC response envelope carrying either a result or an error string.
#[derive(Deserialize, Debug, Clone)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct Response<R> {
    #[serde(default)]
    result: Option<R>,
    #[serde(default)]
    error: Option<String>,
}

impl<R> Response<R> {
    /// Consume response and return value
    pub fn into_result(self) -> Result<R, RpcError> {
        match (self.result, self.error) {
            (_, Some(error)) if !error.is_empty() => Err(RpcError(error)),
            (Some(result), _) => Ok(result),
            (None, _) => Err(RpcError("response carried neither result nor error".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let request = Request::new("", "subscribe", ["Acc/AA/Input"]);
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"jsonrpc":"2.0","id":"","method":"subscribe","params":["Acc/AA/Input"]}"#
        );
    }

    #[test]
    fn response_success() {
        let response: Response<u64> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"","result":19,"error":""}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), 19);
    }

    #[test]
    fn response_error() {
        let response: Response<u64> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"","error":"tx invalid"}"#).unwrap();
        assert_eq!(response.into_result().unwrap_err(), RpcError("tx invalid".to_string()));
    }

    #[test]
    fn empty_error_string_is_not_an_error() {
        let response: Response<u64> =
            serde_json::from_str(r#"{"result":7,"error":""}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), 7);
    }
}

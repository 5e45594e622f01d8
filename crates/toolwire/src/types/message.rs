//! JSON-RPC 2.0 envelope types.
//!
//! [`JsonRpcMessage`] is the only type that crosses the wire. It serializes
//! through [`RawMessage`], a flat struct with every field optional, so shape
//! validation lives in exactly one place: `TryFrom<RawMessage>`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier: number or string. `Null` only appears on error
/// responses to frames whose id could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// A request: expects exactly one response carrying the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,
}

/// A response: success or failure, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    pub id: RequestId,
    pub outcome: ResponseOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Result(Value),
    Error(JsonRpcErrorObject),
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
}

/// A notification (no id, no response expected).
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcNotification {
    pub method: String,
    pub params: Option<Value>,
}

/// Any envelope that can travel over a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage", into = "RawMessage")]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Result(result),
        }
    }

    pub fn error(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }
}

impl JsonRpcErrorObject {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcMessage {
    /// The id of a request or response; `None` for notifications.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Request(req) => Some(&req.id),
            JsonRpcMessage::Response(resp) => Some(&resp.id),
            JsonRpcMessage::Notification(_) => None,
        }
    }

    /// The method of a request or notification; `None` for responses.
    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(req) => Some(&req.method),
            JsonRpcMessage::Notification(notif) => Some(&notif.method),
            JsonRpcMessage::Response(_) => None,
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(req: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(req)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(resp)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notif: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(notif)
    }
}

/// Flat wire form of every envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMessage {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<RequestId>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    method: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    params: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    result: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    error: Option<JsonRpcErrorObject>,
}

/// Distinguishes an explicit `null` (`Some(Null)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TryFrom<RawMessage> for JsonRpcMessage {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match raw.jsonrpc.as_deref() {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(format!(
                    "expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{other}\""
                ))
            }
            None => return Err("missing \"jsonrpc\" field".to_string()),
        }

        match (raw.method, raw.id) {
            (Some(method), id) => {
                if raw.result.is_some() || raw.error.is_some() {
                    return Err(format!(
                        "\"{method}\" carries \"result\" or \"error\" alongside \"method\""
                    ));
                }
                if method.is_empty() {
                    return Err("method name must not be empty".to_string());
                }
                match id {
                    Some(RequestId::Null) => Err("request id must not be null".to_string()),
                    Some(id) => Ok(JsonRpcMessage::Request(JsonRpcRequest {
                        id,
                        method,
                        params: raw.params,
                    })),
                    None => Ok(JsonRpcMessage::Notification(JsonRpcNotification {
                        method,
                        params: raw.params,
                    })),
                }
            }
            (None, Some(id)) => {
                let outcome = match (raw.result, raw.error) {
                    (Some(result), None) => ResponseOutcome::Result(result),
                    (None, Some(error)) => ResponseOutcome::Error(error),
                    (Some(_), Some(_)) => {
                        return Err(format!(
                            "response {id} carries both \"result\" and \"error\""
                        ))
                    }
                    (None, None) => {
                        return Err(format!(
                            "response {id} carries neither \"result\" nor \"error\""
                        ))
                    }
                };
                if id == RequestId::Null && matches!(outcome, ResponseOutcome::Result(_)) {
                    return Err("successful response must not have a null id".to_string());
                }
                Ok(JsonRpcMessage::Response(JsonRpcResponse { id, outcome }))
            }
            (None, None) => Err("envelope has neither \"method\" nor \"id\"".to_string()),
        }
    }
}

impl From<JsonRpcMessage> for RawMessage {
    fn from(msg: JsonRpcMessage) -> Self {
        let mut raw = RawMessage {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            ..Default::default()
        };
        match msg {
            JsonRpcMessage::Request(req) => {
                raw.id = Some(req.id);
                raw.method = Some(req.method);
                raw.params = req.params;
            }
            JsonRpcMessage::Response(resp) => {
                raw.id = Some(resp.id);
                match resp.outcome {
                    ResponseOutcome::Result(result) => raw.result = Some(result),
                    ResponseOutcome::Error(error) => raw.error = Some(error),
                }
            }
            JsonRpcMessage::Notification(notif) => {
                raw.method = Some(notif.method);
                raw.params = notif.params;
            }
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<JsonRpcMessage, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn request_with_numeric_id() {
        let msg = parse(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"})).unwrap();
        match msg {
            JsonRpcMessage::Request(req) => {
                assert_eq!(req.id, RequestId::Number(7));
                assert_eq!(req.method, "tools/list");
                assert!(req.params.is_none());
            }
            other => panic!("Expected request, got {other:?}"),
        }
    }

    #[test]
    fn request_with_string_id() {
        let msg = parse(json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"})).unwrap();
        assert_eq!(msg.id(), Some(&RequestId::String("abc".to_string())));
    }

    #[test]
    fn notification_has_no_id() {
        let msg =
            parse(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Notification(_)));
        assert!(msg.id().is_none());
    }

    #[test]
    fn null_result_is_a_valid_success() {
        let msg = parse(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        match msg {
            JsonRpcMessage::Response(resp) => {
                assert_eq!(resp.outcome, ResponseOutcome::Result(Value::Null))
            }
            other => panic!("Expected response, got {other:?}"),
        }
    }

    #[test]
    fn error_response_with_null_id() {
        let msg = parse(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"code": -32700, "message": "Parse error"}
        }))
        .unwrap();
        assert_eq!(msg.id(), Some(&RequestId::Null));
    }

    #[test]
    fn rejects_response_with_both_result_and_error() {
        let err = parse(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {},
            "error": {"code": 1, "message": "x"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn rejects_response_with_neither_result_nor_error() {
        let err = parse(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn explicit_null_error_or_method_is_not_absent() {
        assert!(parse(json!({"jsonrpc": "2.0", "id": 1, "result": 1, "error": null})).is_err());
        assert!(parse(json!({"jsonrpc": "2.0", "id": 1, "method": null, "result": 1})).is_err());
        assert!(parse(json!({"jsonrpc": "2.0", "method": null})).is_err());
    }

    #[test]
    fn rejects_wrong_version() {
        assert!(parse(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).is_err());
        assert!(parse(json!({"id": 1, "method": "ping"})).is_err());
    }

    #[test]
    fn rejects_null_request_id_and_empty_method() {
        assert!(parse(json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).is_err());
        assert!(parse(json!({"jsonrpc": "2.0", "id": 1, "method": ""})).is_err());
    }

    #[test]
    fn serializes_without_absent_fields() {
        let msg: JsonRpcMessage = JsonRpcNotification::new("notifications/initialized", None).into();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    }
}

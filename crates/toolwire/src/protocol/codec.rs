//! Envelope encoding, decoding, and shape validation.

use serde_json::Value;

use crate::config::DEFAULT_MAX_FRAME_BYTES;
use crate::types::{JsonRpcMessage, McpError, McpResult, RequestId};

/// Stateless codec between text frames and [`JsonRpcMessage`]s.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    max_frame_bytes: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl Codec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    pub fn encode(&self, message: &JsonRpcMessage) -> McpResult<String> {
        serde_json::to_string(message).map_err(McpError::Json)
    }

    /// Decode one frame. Invalid JSON is a `ParseError`; valid JSON of the
    /// wrong shape is a `MalformedEnvelope`.
    pub fn decode(&self, frame: &str) -> McpResult<JsonRpcMessage> {
        if frame.len() > self.max_frame_bytes {
            return Err(McpError::ContentTooLarge {
                size: frame.len(),
                max: self.max_frame_bytes,
            });
        }

        let trimmed = frame.trim();
        if trimmed.is_empty() {
            return Err(McpError::ParseError("Empty message".to_string()));
        }

        let value: Value =
            serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;

        if !value.is_object() {
            return Err(McpError::MalformedEnvelope(
                "envelope must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| McpError::MalformedEnvelope(e.to_string()))
    }
}

/// Best-effort id of a frame that failed to decode, so the error reply can
/// still be correlated by the peer. Falls back to `RequestId::Null`.
pub fn salvage_id(frame: &str) -> RequestId {
    serde_json::from_str::<Value>(frame.trim())
        .ok()
        .and_then(|value| value.get("id").cloned())
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok())
        .unwrap_or(RequestId::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        JsonRpcErrorObject, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    };
    use serde_json::json;

    #[test]
    fn decode_of_encode_is_identity() {
        let codec = Codec::default();
        let messages: Vec<JsonRpcMessage> = vec![
            JsonRpcRequest::new(
                RequestId::Number(1),
                "tools/call",
                Some(json!({"name": "add_numbers", "arguments": {"a": 2, "b": 3}})),
            )
            .into(),
            JsonRpcRequest::new(RequestId::String("req-2".into()), "tools/list", None).into(),
            JsonRpcResponse::success(RequestId::Number(1), json!({"sum": 5})).into(),
            JsonRpcResponse::success(RequestId::Number(9), Value::Null).into(),
            JsonRpcResponse::error(
                RequestId::Number(3),
                JsonRpcErrorObject {
                    code: -32602,
                    message: "Invalid params".into(),
                    data: Some(json!({"field": "b"})),
                },
            )
            .into(),
            JsonRpcResponse::error(RequestId::Null, JsonRpcErrorObject::new(-32700, "Parse error"))
                .into(),
            JsonRpcNotification::new("notifications/initialized", None).into(),
            JsonRpcNotification::new("notifications/cancelled", Some(json!({"requestId": 4})))
                .into(),
        ];

        for message in messages {
            let frame = codec.encode(&message).unwrap();
            assert_eq!(codec.decode(&frame).unwrap(), message, "frame: {frame}");
        }
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let codec = Codec::default();
        let err = codec.decode(r#"{"broken":"#).unwrap_err();
        assert_eq!(err.code(), -32700);
        assert!(matches!(codec.decode("   "), Err(McpError::ParseError(_))));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let codec = Codec::default();
        for frame in [
            r#"[1, 2, 3]"#,
            r#"{"jsonrpc":"2.0","id":1}"#,
            r#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#,
            r#"{"jsonrpc":"2.0"}"#,
            r#"{"jsonrpc":"2.0","id":1,"method":42}"#,
        ] {
            assert!(
                matches!(codec.decode(frame), Err(McpError::MalformedEnvelope(_))),
                "expected malformed: {frame}"
            );
        }
    }

    #[test]
    fn oversized_frame_is_rejected_before_parsing() {
        let codec = Codec::new(16);
        let err = codec
            .decode(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .unwrap_err();
        assert!(matches!(err, McpError::ContentTooLarge { max: 16, .. }));
    }

    #[test]
    fn salvage_id_recovers_readable_ids() {
        assert_eq!(
            salvage_id(r#"{"jsonrpc":"2.0","id":12,"result":1,"error":{}}"#),
            RequestId::Number(12)
        );
        assert_eq!(salvage_id(r#"{"id":"x"}"#), RequestId::String("x".into()));
        assert_eq!(salvage_id("not json"), RequestId::Null);
        assert_eq!(salvage_id(r#"{"id":[1]}"#), RequestId::Null);
    }
}

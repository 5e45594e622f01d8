//! Error types and JSON-RPC error codes for the protocol engine.

use serde_json::Value;

use super::capabilities::CapabilityKind;
use super::message::{JsonRpcErrorObject, JsonRpcResponse, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const PROTOCOL_VERSION_MISMATCH: i32 = -32001;
    pub const NOT_INITIALIZED: i32 = -32002;
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const CONTENT_TOO_LARGE: i32 = -32801;
    pub const CAPABILITY_NOT_FOUND: i32 = -32802;
    pub const TOOL_EXECUTION_ERROR: i32 = -32803;
    pub const RESOURCE_UNAVAILABLE: i32 = -32804;
}

/// All errors that can occur in the protocol engine.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Session not initialized: '{0}' requires a completed handshake")]
    NotInitialized(String),

    #[error(
        "Protocol version mismatch: peer speaks {requested}, supported: {}",
        supported.join(", ")
    )]
    ProtocolVersionMismatch {
        requested: String,
        supported: Vec<String>,
    },

    #[error("Content too large: {size} bytes exceeds {max} bytes")]
    ContentTooLarge { size: usize, max: usize },

    #[error("{kind} not found: {name}")]
    CapabilityNotFound { kind: CapabilityKind, name: String },

    #[error("{kind} already registered: {name}")]
    DuplicateCapability { kind: CapabilityKind, name: String },

    #[error("Tool execution failed: {0}")]
    ToolExecutionError(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Request '{method}' timed out after {timeout_ms}ms")]
    RequestTimedOut { method: String, timeout_ms: u64 },

    #[error("Connection closed")]
    ConnectionClosed,

    /// An error response received from the peer.
    #[error("JSON-RPC error (code {code}): {message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::MalformedEnvelope(_) | McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::NotInitialized(_) => NOT_INITIALIZED,
            McpError::ProtocolVersionMismatch { .. } => PROTOCOL_VERSION_MISMATCH,
            McpError::ContentTooLarge { .. } => CONTENT_TOO_LARGE,
            McpError::CapabilityNotFound { .. } => CAPABILITY_NOT_FOUND,
            McpError::ToolExecutionError(_) => TOOL_EXECUTION_ERROR,
            McpError::ResourceUnavailable(_) => RESOURCE_UNAVAILABLE,
            McpError::RequestCancelled => REQUEST_CANCELLED,
            McpError::Rpc { code, .. } => *code,
            McpError::DuplicateCapability { .. }
            | McpError::RequestTimedOut { .. }
            | McpError::ConnectionClosed
            | McpError::Transport(_)
            | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    /// Failures of a single inbound frame: reported to the peer and counted
    /// toward the malformed-frame limit, never fatal on their own.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            McpError::ParseError(_)
                | McpError::MalformedEnvelope(_)
                | McpError::ContentTooLarge { .. }
        )
    }

    /// The error a handler of `kind` failed with, as `message`.
    pub fn handler_failure(kind: CapabilityKind, message: String) -> Self {
        match kind {
            CapabilityKind::Tool => McpError::ToolExecutionError(message),
            CapabilityKind::Resource => McpError::ResourceUnavailable(message),
            CapabilityKind::Prompt => McpError::InternalError(message),
        }
    }

    /// Keep request-scoped errors as they are; anything else a handler
    /// returns becomes the failure of its capability kind.
    pub fn into_handler_failure(self, kind: CapabilityKind) -> Self {
        match self {
            McpError::InvalidParams(_)
            | McpError::CapabilityNotFound { .. }
            | McpError::ToolExecutionError(_)
            | McpError::ResourceUnavailable(_)
            | McpError::Rpc { .. } => self,
            other => Self::handler_failure(kind, other.to_string()),
        }
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            McpError::Rpc {
                code,
                message,
                data,
            } => JsonRpcErrorObject {
                code: *code,
                message: message.clone(),
                data: data.clone(),
            },
            McpError::ProtocolVersionMismatch {
                requested,
                supported,
            } => JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: Some(serde_json::json!({
                    "requested": requested,
                    "supported": supported,
                })),
            },
            other => JsonRpcErrorObject::new(other.code(), other.to_string()),
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.to_error_object())
    }

    /// Wrap an error object received from the peer.
    pub fn from_error_object(error: JsonRpcErrorObject) -> Self {
        McpError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_scoped_errors_map_to_wire_codes() {
        assert_eq!(McpError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(McpError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(McpError::NotInitialized("tools/list".into()).code(), -32002);
        assert_eq!(
            McpError::CapabilityNotFound {
                kind: CapabilityKind::Resource,
                name: "file:///nope".into()
            }
            .code(),
            -32802
        );
    }

    #[test]
    fn rpc_error_round_trips_through_error_object() {
        let obj = JsonRpcErrorObject {
            code: -32099,
            message: "custom".to_string(),
            data: Some(serde_json::json!({"hint": 1})),
        };
        let err = McpError::from_error_object(obj.clone());
        assert_eq!(err.code(), -32099);
        assert_eq!(err.to_error_object(), obj);
    }

    #[test]
    fn capability_not_found_names_the_kind() {
        let err = McpError::CapabilityNotFound {
            kind: CapabilityKind::Tool,
            name: "missing".into(),
        };
        assert_eq!(err.to_string(), "Tool not found: missing");
    }

    #[test]
    fn handler_failures_take_the_code_of_their_kind() {
        let json_err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = McpError::from(json_err).into_handler_failure(CapabilityKind::Tool);
        assert_eq!(err.code(), mcp_error_codes::TOOL_EXECUTION_ERROR);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = McpError::from(io).into_handler_failure(CapabilityKind::Resource);
        assert_eq!(err.code(), mcp_error_codes::RESOURCE_UNAVAILABLE);

        let err = McpError::Transport("x".into()).into_handler_failure(CapabilityKind::Prompt);
        assert_eq!(err.code(), error_codes::INTERNAL_ERROR);
    }

    #[test]
    fn request_scoped_handler_errors_are_kept() {
        let err = McpError::InvalidParams("a".into()).into_handler_failure(CapabilityKind::Tool);
        assert!(matches!(err, McpError::InvalidParams(_)));

        let err = McpError::Rpc {
            code: -32050,
            message: "upstream".into(),
            data: None,
        }
        .into_handler_failure(CapabilityKind::Resource);
        assert_eq!(err.code(), -32050);
    }

    #[test]
    fn frame_errors_are_recognised() {
        assert!(McpError::ParseError("x".into()).is_frame_error());
        assert!(McpError::ContentTooLarge { size: 2, max: 1 }.is_frame_error());
        assert!(!McpError::ConnectionClosed.is_frame_error());
        assert!(!McpError::Io(std::io::Error::other("x")).is_frame_error());
    }
}

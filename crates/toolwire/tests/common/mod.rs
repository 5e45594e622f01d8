//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use toolwire::{
    resource_fn, tool_fn, CapabilityRegistry, ChannelTransport, McpError, ReadResourceResult,
    ResourceContent, ResourceDefinition, ServerConfig, ToolDefinition,
};

pub const EXAMPLE_URI: &str = "file:///example.txt";
pub const EXAMPLE_TEXT: &str = "Hello, this is the content of example.txt!";

fn tool(name: &str, description: &str, schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    }
}

/// Registry with `add_numbers`, `slow`, `explode`, `count` and one resource.
/// `calls` is bumped every time `count` runs.
pub fn test_registry(calls: Arc<AtomicUsize>) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();

    registry
        .register_tool(
            tool(
                "add_numbers",
                "Add two numbers",
                json!({
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                }),
            ),
            tool_fn(|args| async move {
                let a = args.get("a").and_then(Value::as_f64);
                let b = args.get("b").and_then(Value::as_f64);
                match (a, b) {
                    (Some(a), Some(b)) => Ok(json!({"sum": a + b})),
                    _ => Err(McpError::InvalidParams(
                        "'a' and 'b' are required numbers".to_string(),
                    )),
                }
            }),
        )
        .unwrap();

    registry
        .register_tool(
            tool("slow", "Sleep, then answer", json!({"type": "object"})),
            tool_fn(|args| async move {
                let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(100);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(json!({"slept": ms}))
            }),
        )
        .unwrap();

    registry
        .register_tool(
            tool("explode", "Always panics", json!({"type": "object"})),
            tool_fn(|_| async move {
                if true {
                    panic!("tool exploded");
                }
                Ok(Value::Null)
            }),
        )
        .unwrap();

    registry
        .register_tool(
            tool("count", "Count invocations", json!({"type": "object"})),
            tool_fn(move |_| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(json!({"count": n}))
                }
            }),
        )
        .unwrap();

    registry
        .register_resource(
            ResourceDefinition {
                uri: EXAMPLE_URI.to_string(),
                name: "example.txt".to_string(),
                description: Some("An example text file".to_string()),
                mime_type: Some("text/plain".to_string()),
            },
            resource_fn(|uri| async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContent::text(uri, Some("text/plain"), EXAMPLE_TEXT)],
                })
            }),
        )
        .unwrap();

    registry
}

pub fn config(versions: &[&str]) -> ServerConfig {
    ServerConfig::default()
        .with_versions(versions.iter().copied())
        .with_server_info("test-server", "0.0.1")
}

/// Build a JSON-RPC request frame.
pub fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

pub fn mcp_notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    })
}

pub fn init_request(id: i64, version: &str) -> Value {
    mcp_request(
        id,
        "initialize",
        json!({
            "protocolVersion": version,
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

/// A hand-driven peer speaking raw frames over an in-process channel.
pub struct RawPeer {
    pub end: ChannelTransport,
}

impl RawPeer {
    pub fn new(end: ChannelTransport) -> Self {
        Self { end }
    }

    pub fn send(&self, msg: Value) {
        self.end.send(msg.to_string()).unwrap();
    }

    pub fn send_raw(&self, frame: &str) {
        self.end.send(frame).unwrap();
    }

    /// Next frame as JSON. Panics after two seconds of silence or on close.
    pub async fn recv(&mut self) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(2), self.end.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed");
        serde_json::from_str(&frame).unwrap()
    }

    /// `None` when the other side has closed its sending half.
    pub async fn recv_or_closed(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(2), self.end.recv())
            .await
            .expect("timed out waiting for a frame or close")
            .map(|frame| serde_json::from_str(&frame).unwrap())
    }

    /// Asserts that nothing arrives within `ms`.
    pub async fn expect_silence(&mut self, ms: u64) {
        let next = tokio::time::timeout(Duration::from_millis(ms), self.end.recv()).await;
        assert!(next.is_err(), "expected silence, got {next:?}");
    }
}

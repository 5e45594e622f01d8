//! Toolwire — a bidirectional JSON-RPC protocol engine for MCP-style tool,
//! resource, and prompt servers and their clients.

pub mod client;
pub mod config;
pub mod correlation;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{Client, NotificationCallback, PendingCall};
pub use config::{ClientConfig, ServerConfig};
pub use correlation::CorrelationTable;
pub use protocol::{BuiltinMethod, Codec, ProtocolHandler};
pub use registry::{
    prompt_fn, resource_fn, tool_fn, CapabilityDescriptor, CapabilityRegistry, Handler,
    PromptHandler, ResourceHandler, ToolHandler,
};
pub use server::Server;
pub use session::{ServerSession, SessionState};
pub use transport::{
    channel_pair, ChannelTransport, FrameSink, FrameStream, LineTransport, StdioTransport,
    Transport, WebSocketTransport,
};
pub use types::*;

//! Transport layer: ordered, reliable, bidirectional text frames.
//!
//! A transport is split once into a sending half and a receiving half so the
//! session can read and write from separate tasks.

pub mod channel;
pub mod stream;
pub mod websocket;

use async_trait::async_trait;

use crate::types::McpResult;

pub use channel::{channel_pair, ChannelTransport};
pub use stream::{LineTransport, StdioTransport};
pub use websocket::WebSocketTransport;

/// Outbound half of a transport.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> McpResult<()>;

    /// Flush and close the outbound direction. Closing twice is a no-op.
    async fn close(&mut self) -> McpResult<()>;
}

/// Inbound half of a transport. `Ok(None)` means the peer closed cleanly.
#[async_trait]
pub trait FrameStream: Send {
    async fn receive(&mut self) -> McpResult<Option<String>>;
}

pub trait Transport: Send + 'static {
    type Sink: FrameSink + 'static;
    type Stream: FrameStream + 'static;

    fn split(self) -> (Self::Sink, Self::Stream);
}

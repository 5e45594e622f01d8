//! In-process transport backed by tokio mpsc channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{FrameSink, FrameStream, Transport};
use crate::types::{McpError, McpResult};

/// One end of an in-process duplex link.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Two connected ends: frames sent on one are received on the other.
pub fn channel_pair() -> (ChannelTransport, ChannelTransport) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (
        ChannelTransport { tx: a_tx, rx: a_rx },
        ChannelTransport { tx: b_tx, rx: b_rx },
    )
}

impl ChannelTransport {
    /// Send a raw frame without splitting. Useful for driving a session by hand.
    pub fn send(&self, frame: impl Into<String>) -> McpResult<()> {
        self.tx
            .send(frame.into())
            .map_err(|_| McpError::ConnectionClosed)
    }

    /// Receive a raw frame without splitting. `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

pub struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

pub struct ChannelStream {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Transport for ChannelTransport {
    type Sink = ChannelSink;
    type Stream = ChannelStream;

    fn split(self) -> (ChannelSink, ChannelStream) {
        (ChannelSink { tx: Some(self.tx) }, ChannelStream { rx: self.rx })
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> McpResult<()> {
        match &self.tx {
            Some(tx) => tx.send(frame).map_err(|_| McpError::ConnectionClosed),
            None => Err(McpError::ConnectionClosed),
        }
    }

    async fn close(&mut self) -> McpResult<()> {
        self.tx = None;
        Ok(())
    }
}

#[async_trait]
impl FrameStream for ChannelStream {
    async fn receive(&mut self) -> McpResult<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_cross_in_both_directions() {
        let (a, b) = channel_pair();
        let (mut a_sink, mut a_stream) = a.split();
        let (mut b_sink, mut b_stream) = b.split();

        a_sink.send("to b".to_string()).await.unwrap();
        b_sink.send("to a".to_string()).await.unwrap();

        assert_eq!(b_stream.receive().await.unwrap().as_deref(), Some("to b"));
        assert_eq!(a_stream.receive().await.unwrap().as_deref(), Some("to a"));
    }

    #[tokio::test]
    async fn closing_the_sink_ends_the_peer_stream() {
        let (a, b) = channel_pair();
        let (mut a_sink, _a_stream) = a.split();
        let (_b_sink, mut b_stream) = b.split();

        a_sink.close().await.unwrap();
        assert!(b_stream.receive().await.unwrap().is_none());
        assert!(matches!(
            a_sink.send("late".to_string()).await,
            Err(McpError::ConnectionClosed)
        ));
    }
}

//! WebSocket transport: one envelope per text message.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{FrameSink, FrameStream, Transport};
use crate::types::{McpError, McpResult};

pub struct WebSocketTransport<S> {
    ws: WebSocketStream<S>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
    /// Open a client connection to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> McpResult<Self> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| McpError::Transport(format!("Failed to connect to {url}: {e}")))?;
        tracing::debug!("WebSocket connected to {url}");
        Ok(Self { ws })
    }
}

impl WebSocketTransport<TcpStream> {
    /// Complete the server side of the WebSocket handshake on an accepted socket.
    pub async fn accept(stream: TcpStream) -> McpResult<Self> {
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| McpError::Transport(format!("WebSocket handshake failed: {e}")))?;
        Ok(Self { ws })
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn from_stream(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }
}

pub struct WebSocketSink<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    closed: bool,
}

pub struct WebSocketFrames<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Sink = WebSocketSink<S>;
    type Stream = WebSocketFrames<S>;

    fn split(self) -> (WebSocketSink<S>, WebSocketFrames<S>) {
        let (sink, stream) = self.ws.split();
        (
            WebSocketSink {
                sink,
                closed: false,
            },
            WebSocketFrames { stream },
        )
    }
}

#[async_trait]
impl<S> FrameSink for WebSocketSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: String) -> McpResult<()> {
        if self.closed {
            return Err(McpError::ConnectionClosed);
        }
        self.sink.send(Message::Text(frame)).await.map_err(ws_error)
    }

    async fn close(&mut self) -> McpResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(ws_error(e)),
        }
    }
}

#[async_trait]
impl<S> FrameStream for WebSocketFrames<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> McpResult<Option<String>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Binary(bytes)) => {
                    return String::from_utf8(bytes).map(Some).map_err(|_| {
                        McpError::ParseError("binary frame is not valid UTF-8".to_string())
                    })
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!("WebSocket closed by peer: {frame:?}");
                    return Ok(None);
                }
                Ok(_) => continue,
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => return Ok(None),
                Err(e) => return Err(ws_error(e)),
            }
        }
        Ok(None)
    }
}

fn ws_error(e: WsError) -> McpError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => McpError::ConnectionClosed,
        WsError::Io(io) => McpError::Io(io),
        other => McpError::Transport(other.to_string()),
    }
}

//! Newline-delimited frames over any async byte stream (stdio, TCP, pipes).

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::{FrameSink, FrameStream, Transport};
use crate::config::DEFAULT_MAX_FRAME_BYTES;
use crate::types::{McpError, McpResult};

/// One JSON envelope per line.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    max_frame_bytes: usize,
}

/// Stdio transport for desktop MCP clients: reads stdin, writes stdout.
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Longest line buffered before it is discarded as `ContentTooLarge`.
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}

impl LineTransport<tokio::io::Stdin, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl LineTransport<OwnedReadHalf, OwnedWriteHalf> {
    pub fn tcp(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer)
    }
}

pub struct LineSink<W> {
    writer: W,
    closed: bool,
}

pub struct LineStream<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    max_frame_bytes: usize,
}

impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Sink = LineSink<W>;
    type Stream = LineStream<R>;

    fn split(self) -> (LineSink<W>, LineStream<R>) {
        (
            LineSink {
                writer: self.writer,
                closed: false,
            },
            LineStream {
                reader: BufReader::new(self.reader),
                line: Vec::new(),
                max_frame_bytes: self.max_frame_bytes,
            },
        )
    }
}

#[async_trait]
impl<W> FrameSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: String) -> McpResult<()> {
        if self.closed {
            return Err(McpError::ConnectionClosed);
        }
        if frame.contains('\n') {
            return Err(McpError::Transport(
                "frame contains a raw newline".to_string(),
            ));
        }
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> McpResult<()> {
        if !self.closed {
            self.closed = true;
            self.writer.shutdown().await?;
        }
        Ok(())
    }
}

impl<R> LineStream<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read up to the next newline, but never buffer more than one byte past
    /// the frame limit.
    async fn read_bounded(&mut self) -> McpResult<usize> {
        let limit = self.max_frame_bytes as u64 + 1;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await?;
        Ok(read)
    }

    /// Drop the rest of an oversized line. Returns its total length.
    async fn skip_rest_of_line(&mut self) -> McpResult<usize> {
        let mut size = self.line.len();
        loop {
            self.line.clear();
            let read = self.read_bounded().await?;
            size += read;
            if read == 0 || self.line.last() == Some(&b'\n') {
                self.line.clear();
                return Ok(size);
            }
        }
    }
}

#[async_trait]
impl<R> FrameStream for LineStream<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn receive(&mut self) -> McpResult<Option<String>> {
        loop {
            self.line.clear();
            let bytes_read = self.read_bounded().await?;
            if bytes_read == 0 {
                tracing::debug!("EOF on line transport");
                return Ok(None);
            }

            let terminated = self.line.last() == Some(&b'\n');
            if !terminated && self.line.len() > self.max_frame_bytes {
                let size = self.skip_rest_of_line().await?;
                return Err(McpError::ContentTooLarge {
                    size,
                    max: self.max_frame_bytes,
                });
            }

            let line = std::str::from_utf8(&self.line)
                .map_err(|e| McpError::ParseError(format!("frame is not valid UTF-8: {e}")))?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_are_newline_delimited_and_blank_lines_skipped() {
        let (client, server) = tokio::io::duplex(1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);

        let (mut sink, _) = LineTransport::new(client_read, client_write).split();
        let (_, mut stream) = LineTransport::new(server_read, server_write).split();

        sink.send(r#"{"a":1}"#.to_string()).await.unwrap();
        sink.send(r#"{"b":2}"#.to_string()).await.unwrap();

        assert_eq!(stream.receive().await.unwrap().as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(stream.receive().await.unwrap().as_deref(), Some(r#"{"b":2}"#));

        sink.close().await.unwrap();
        assert!(stream.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn embedded_newline_is_refused() {
        let (client, _server) = tokio::io::duplex(64);
        let (r, w) = tokio::io::split(client);
        let (mut sink, _) = LineTransport::new(r, w).split();
        assert!(matches!(
            sink.send("a\nb".to_string()).await,
            Err(McpError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_a_frame_error_and_reading_continues() {
        let (client, server) = tokio::io::duplex(1024);
        let (_, mut client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);
        let (_, mut stream) = LineTransport::new(server_read, server_write).split();

        client_write.write_all(b"\xff\xfe\n{\"ok\":1}\n").await.unwrap();

        assert!(matches!(stream.receive().await, Err(McpError::ParseError(_))));
        assert_eq!(stream.receive().await.unwrap().as_deref(), Some(r#"{"ok":1}"#));
    }

    #[tokio::test]
    async fn oversized_line_is_discarded_and_reading_continues() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (_, mut client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);
        let (_, mut stream) = LineTransport::new(server_read, server_write)
            .with_max_frame_bytes(16)
            .split();

        let long = "x".repeat(100);
        client_write
            .write_all(format!("{long}\n{{\"a\":1}}\n").as_bytes())
            .await
            .unwrap();

        match stream.receive().await {
            Err(McpError::ContentTooLarge { size, max }) => {
                assert_eq!(max, 16);
                assert_eq!(size, 101);
            }
            other => panic!("expected ContentTooLarge, got {other:?}"),
        }
        assert_eq!(stream.receive().await.unwrap().as_deref(), Some(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let (client, server) = tokio::io::duplex(1024);
        let (_, mut client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);
        let (_, mut stream) = LineTransport::new(server_read, server_write)
            .with_max_frame_bytes(8)
            .split();

        client_write.write_all(b"12345678\n").await.unwrap();
        assert_eq!(stream.receive().await.unwrap().as_deref(), Some("12345678"));
    }
}

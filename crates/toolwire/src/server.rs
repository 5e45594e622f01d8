//! Server entry points: one [`ServerSession`] per accepted connection, all
//! sharing the same registry.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::registry::CapabilityRegistry;
use crate::session::ServerSession;
use crate::transport::{StdioTransport, Transport, WebSocketTransport};
use crate::types::McpResult;

#[derive(Clone)]
pub struct Server {
    registry: Arc<CapabilityRegistry>,
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(registry: CapabilityRegistry, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// A fresh session for one connection.
    pub fn session(&self) -> ServerSession {
        ServerSession::new(Arc::clone(&self.registry), Arc::clone(&self.config))
    }

    /// Serve a single connection to completion.
    pub async fn serve<T: Transport>(&self, transport: T) -> McpResult<()> {
        self.session().run(transport).await
    }

    /// Serve a single connection on a background task.
    pub fn spawn<T: Transport>(&self, transport: T) -> JoinHandle<McpResult<()>> {
        let session = self.session();
        tokio::spawn(session.run(transport))
    }

    /// Serve stdin/stdout until EOF.
    pub async fn serve_stdio(&self) -> McpResult<()> {
        tracing::info!("Stdio transport started");
        self.serve(StdioTransport::stdio().with_max_frame_bytes(self.config.max_frame_bytes))
            .await
    }

    /// Accept WebSocket connections forever, one session per connection.
    pub async fn serve_websocket(&self, listener: TcpListener) -> McpResult<()> {
        tracing::info!("WebSocket server listening on ws://{}", listener.local_addr()?);

        loop {
            let (socket, peer) = listener.accept().await?;
            let server = self.clone();
            tokio::spawn(async move {
                tracing::info!("Accepted connection from {peer}");
                let transport = match WebSocketTransport::accept(socket).await {
                    Ok(transport) => transport,
                    Err(e) => {
                        tracing::warn!("Rejected connection from {peer}: {e}");
                        return;
                    }
                };
                if let Err(e) = server.serve(transport).await {
                    tracing::debug!("Connection from {peer} ended with error: {e}");
                }
            });
        }
    }
}

//! Client side of a connection: handshake, request correlation, and routing
//! of server-initiated traffic.
//!
//! A [`Client`] owns two background tasks. The writer drains an outbound
//! queue into the transport; the reader decodes inbound frames and routes
//! responses to the correlation table, notifications to the registered
//! callback, and server requests to a minimal built-in responder.

mod pending;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::correlation::CorrelationTable;
use crate::protocol::{BuiltinMethod, Codec};
use crate::session::server::write_frames;
use crate::session::SessionState;
use crate::transport::{FrameStream, Transport, WebSocketTransport};
use crate::types::notification::{CANCELLED, INITIALIZED};
use crate::types::*;

pub use pending::PendingCall;

/// Invoked on the reader task for every server notification. Must not block.
pub type NotificationCallback = Arc<dyn Fn(JsonRpcNotification) + Send + Sync>;

pub(crate) struct ClientInner {
    config: ClientConfig,
    table: CorrelationTable,
    outbound: Mutex<Option<mpsc::UnboundedSender<JsonRpcMessage>>>,
    state: Mutex<SessionState>,
    server: Mutex<Option<InitializeResult>>,
    on_notification: Mutex<Option<NotificationCallback>>,
}

pub struct Client {
    inner: Arc<ClientInner>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Start the background tasks over `transport`. No handshake is performed;
    /// call [`Client::initialize`] next.
    pub fn new<T: Transport>(transport: T, config: ClientConfig) -> Self {
        let codec = Codec::new(config.max_frame_bytes);
        let (sink, stream) = transport.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(ClientInner {
            config,
            table: CorrelationTable::new(),
            outbound: Mutex::new(Some(outbound)),
            state: Mutex::new(SessionState::Unestablished),
            server: Mutex::new(None),
            on_notification: Mutex::new(None),
        });

        let writer = tokio::spawn(write_frames(sink, outbound_rx, codec).in_current_span());
        let reader = tokio::spawn(read_frames(stream, codec, Arc::clone(&inner)).in_current_span());

        Self {
            inner,
            reader: Some(reader),
            writer: Some(writer),
        }
    }

    /// Connect over WebSocket and complete the handshake.
    pub async fn connect_websocket(url: &str, config: ClientConfig) -> McpResult<Self> {
        let transport = WebSocketTransport::connect(url).await?;
        let client = Self::new(transport, config);
        client.initialize().await?;
        Ok(client)
    }

    /// Replace the callback that receives server notifications.
    pub async fn on_notification<F>(&self, callback: F)
    where
        F: Fn(JsonRpcNotification) + Send + Sync + 'static,
    {
        *self.inner.on_notification.lock().await = Some(Arc::new(callback));
    }

    /// Perform the handshake. Any failure closes the session.
    pub async fn initialize(&self) -> McpResult<InitializeResult> {
        self.inner.state.lock().await.begin_negotiation()?;

        match self.negotiate().await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("Handshake failed: {e}");
                self.inner.shutdown().await;
                Err(e)
            }
        }
    }

    async fn negotiate(&self) -> McpResult<InitializeResult> {
        let config = &self.inner.config;
        let params = InitializeParams {
            protocol_version: config.protocol_version.clone(),
            capabilities: ClientCapabilities::requesting(&config.requested),
            client_info: Some(config.client_info.clone()),
        };
        let params = serde_json::to_value(params)?;

        let value = match self
            .start_unchecked(BuiltinMethod::Initialize.as_str(), Some(params))
            .await?
            .wait()
            .await
        {
            Ok(value) => value,
            Err(McpError::Rpc { code, data, .. })
                if code == mcp_error_codes::PROTOCOL_VERSION_MISMATCH =>
            {
                return Err(version_mismatch_from(data, &config.protocol_version));
            }
            Err(e) => return Err(e),
        };

        let result: InitializeResult = serde_json::from_value(value)
            .map_err(|e| McpError::InvalidParams(format!("invalid initialize result: {e}")))?;

        if !config.supported_versions.contains(&result.protocol_version) {
            return Err(McpError::ProtocolVersionMismatch {
                requested: result.protocol_version,
                supported: config.supported_versions.clone(),
            });
        }

        self.inner.state.lock().await.activate()?;
        tracing::info!(
            "Connected to {} v{} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );
        *self.inner.server.lock().await = Some(result.clone());

        self.notify(INITIALIZED, None).await?;
        Ok(result)
    }

    /// Send a request and wait for its result, the request timeout, or
    /// connection loss.
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        self.start_request(method, params).await?.wait().await
    }

    /// Send a request and return a handle that can be awaited or cancelled.
    pub async fn start_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> McpResult<PendingCall> {
        if method == BuiltinMethod::Initialize.as_str() {
            return Err(McpError::InvalidRequest(
                "use Client::initialize for the handshake".to_string(),
            ));
        }
        self.inner.state.lock().await.require_active(method)?;
        self.start_unchecked(method, params).await
    }

    async fn start_unchecked(&self, method: &str, params: Option<Value>) -> McpResult<PendingCall> {
        let (id, completion) = self.inner.table.register(method).await?;
        let request = JsonRpcRequest::new(id.clone(), method, params);
        if let Err(e) = self.inner.send(request.into()).await {
            self.inner.table.forget(&id).await;
            return Err(e);
        }
        Ok(PendingCall::new(
            Arc::clone(&self.inner),
            id,
            method.to_string(),
            completion,
        ))
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.inner
            .send(JsonRpcNotification::new(method, params).into())
            .await
    }

    pub async fn ping(&self) -> McpResult<()> {
        self.send_request(BuiltinMethod::Ping.as_str(), None).await?;
        Ok(())
    }

    pub async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        let result: ToolListResult = self.typed(BuiltinMethod::ToolsList, None).await?;
        Ok(result.tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        self.send_request(
            BuiltinMethod::ToolsCall.as_str(),
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    pub async fn list_resources(&self) -> McpResult<Vec<ResourceDefinition>> {
        let result: ResourceListResult = self.typed(BuiltinMethod::ResourcesList, None).await?;
        Ok(result.resources)
    }

    pub async fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        self.typed(BuiltinMethod::ResourcesRead, Some(json!({"uri": uri})))
            .await
    }

    pub async fn list_prompts(&self) -> McpResult<Vec<PromptDefinition>> {
        let result: PromptListResult = self.typed(BuiltinMethod::PromptsList, None).await?;
        Ok(result.prompts)
    }

    pub async fn get_prompt(&self, name: &str, arguments: Value) -> McpResult<PromptGetResult> {
        self.typed(
            BuiltinMethod::PromptsGet,
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    async fn typed<T: DeserializeOwned>(
        &self,
        method: BuiltinMethod,
        params: Option<Value>,
    ) -> McpResult<T> {
        let value = self.send_request(method.as_str(), params).await?;
        serde_json::from_value(value)
            .map_err(|e| McpError::InternalError(format!("unexpected {method} result: {e}")))
    }

    pub async fn state(&self) -> SessionState {
        *self.inner.state.lock().await
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.state.lock().await.is_closed()
    }

    /// The server's handshake response, once the session is active.
    pub async fn server(&self) -> Option<InitializeResult> {
        self.inner.server.lock().await.clone()
    }

    /// Number of requests still awaiting a response.
    pub async fn pending_requests(&self) -> usize {
        self.inner.table.len().await
    }

    /// Close the session: fail outstanding requests, flush queued frames, and
    /// close the transport.
    pub async fn close(mut self) -> McpResult<()> {
        self.inner.shutdown().await;
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                tracing::error!("Writer task failed: {e}");
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
    }
}

impl ClientInner {
    async fn send(&self, message: JsonRpcMessage) -> McpResult<()> {
        match self.outbound.lock().await.as_ref() {
            Some(tx) => tx.send(message).map_err(|_| McpError::ConnectionClosed),
            None => Err(McpError::ConnectionClosed),
        }
    }

    /// `Any → Closed`: fail pending requests and stop accepting sends.
    async fn shutdown(&self) {
        let was_open = self.state.lock().await.close();
        let failed = self.table.close().await;
        self.outbound.lock().await.take();
        if was_open {
            tracing::info!("Client session closed ({failed} pending requests failed)");
        }
    }

    async fn cancel(&self, id: &RequestId, reason: Option<&str>) -> McpResult<bool> {
        if !self.table.forget(id).await {
            return Ok(false);
        }
        let params = serde_json::to_value(CancelledParams {
            request_id: id.clone(),
            reason: reason.map(str::to_string),
        })?;
        self.send(JsonRpcNotification::new(CANCELLED, Some(params)).into())
            .await?;
        Ok(true)
    }

    async fn handle_server_request(&self, request: JsonRpcRequest) {
        let response = match BuiltinMethod::parse(&request.method) {
            Some(BuiltinMethod::Ping) => JsonRpcResponse::success(request.id, json!({})),
            _ => {
                tracing::debug!("Rejecting server request '{}'", request.method);
                McpError::MethodNotFound(request.method).to_json_rpc_error(request.id)
            }
        };
        if let Err(e) = self.send(response.into()).await {
            tracing::debug!("Could not answer server request: {e}");
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        let callback = self.on_notification.lock().await.clone();
        match callback {
            Some(callback) => callback(notification),
            None => tracing::debug!("Unhandled server notification: {}", notification.method),
        }
    }
}

async fn read_frames<S: FrameStream>(mut stream: S, codec: Codec, inner: Arc<ClientInner>) {
    let max_malformed = inner.config.max_malformed_frames.max(1);
    let mut malformed = 0u32;

    loop {
        let decoded = match stream.receive().await {
            Ok(Some(frame)) => codec.decode(&frame),
            Ok(None) => {
                tracing::info!("Server closed the connection");
                break;
            }
            Err(e) if e.is_frame_error() => Err(e),
            Err(e) => {
                tracing::warn!("Transport error: {e}");
                break;
            }
        };

        match decoded {
            Ok(message) => {
                malformed = 0;
                match message {
                    JsonRpcMessage::Response(response) => {
                        inner.table.complete(response).await;
                    }
                    JsonRpcMessage::Notification(notification) => {
                        inner.handle_notification(notification).await;
                    }
                    JsonRpcMessage::Request(request) => {
                        inner.handle_server_request(request).await;
                    }
                }
            }
            Err(e) => {
                malformed += 1;
                tracing::warn!("Malformed frame from server ({malformed}/{max_malformed}): {e}");
                if malformed >= max_malformed {
                    break;
                }
            }
        }
    }

    inner.shutdown().await;
}

fn version_mismatch_from(data: Option<Value>, requested: &str) -> McpError {
    let supported = data
        .as_ref()
        .and_then(|d| d.get("supported"))
        .and_then(|s| serde_json::from_value::<Vec<String>>(s.clone()).ok())
        .unwrap_or_default();
    McpError::ProtocolVersionMismatch {
        requested: requested.to_string(),
        supported,
    }
}

//! Server side of one connection: the receive loop, in-flight request tasks,
//! and teardown.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::protocol::{salvage_id, BuiltinMethod, Codec, ProtocolHandler};
use crate::registry::CapabilityRegistry;
use crate::transport::{FrameSink, FrameStream, Transport};
use crate::types::notification::CANCELLED;
use crate::types::{
    CancelledParams, JsonRpcMessage, JsonRpcRequest, McpError, McpResult, RequestId,
};

type Outbound = mpsc::UnboundedSender<JsonRpcMessage>;
type InFlight = Arc<Mutex<HashMap<RequestId, AbortHandle>>>;

/// Drives one server connection until the peer goes away or the session
/// hits a connection-fatal error.
pub struct ServerSession {
    handler: Arc<ProtocolHandler>,
    codec: Codec,
    max_malformed_frames: u32,
    in_flight: InFlight,
}

impl ServerSession {
    pub fn new(registry: Arc<CapabilityRegistry>, config: Arc<ServerConfig>) -> Self {
        Self {
            codec: Codec::new(config.max_frame_bytes),
            max_malformed_frames: config.max_malformed_frames.max(1),
            handler: Arc::new(ProtocolHandler::new(registry, config)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The dispatcher, for inspecting session state from outside the loop.
    pub fn handler(&self) -> Arc<ProtocolHandler> {
        Arc::clone(&self.handler)
    }

    /// Run until the connection ends. A clean close by the peer is `Ok(())`.
    pub async fn run<T: Transport>(self, transport: T) -> McpResult<()> {
        let span = tracing::info_span!("connection", id = %Uuid::new_v4());
        self.run_loop(transport).instrument(span).await
    }

    async fn run_loop<T: Transport>(self, transport: T) -> McpResult<()> {
        let (sink, mut stream) = transport.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_frames(sink, outbound_rx, self.codec).in_current_span());

        tracing::info!("Session opened");
        let mut malformed = 0u32;

        let outcome: McpResult<()> = loop {
            let frame = tokio::select! {
                frame = stream.receive() => frame,
                _ = outbound.closed() => break Err(McpError::ConnectionClosed),
            };
            let decoded = match frame {
                Ok(Some(frame)) => self.codec.decode(&frame).map_err(|e| (e, Some(frame))),
                Ok(None) => {
                    tracing::info!("Peer closed the connection");
                    break Ok(());
                }
                Err(e) if e.is_frame_error() => Err((e, None)),
                Err(e) => break Err(e),
            };

            let message = match decoded {
                Ok(message) => {
                    malformed = 0;
                    message
                }
                Err((e, frame)) => {
                    malformed += 1;
                    tracing::warn!(
                        "Malformed frame ({malformed}/{}): {e}",
                        self.max_malformed_frames
                    );
                    let id = match (&e, frame) {
                        (McpError::ContentTooLarge { .. }, _) | (_, None) => RequestId::Null,
                        (_, Some(frame)) => salvage_id(&frame),
                    };
                    let _ = outbound.send(e.to_json_rpc_error(id).into());
                    if malformed >= self.max_malformed_frames {
                        break Err(McpError::MalformedEnvelope(format!(
                            "{malformed} consecutive malformed frames"
                        )));
                    }
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Request(request)
                    if request.method == BuiltinMethod::Initialize.as_str() =>
                {
                    // Inline so that later frames observe the negotiated state.
                    let response = self.handler.handle_request(request).await;
                    let _ = outbound.send(response.into());
                    if self.handler.is_closed().await {
                        break Err(McpError::InvalidRequest("handshake failed".to_string()));
                    }
                }
                JsonRpcMessage::Request(request) => {
                    if let Err(e) = self.spawn_request(request, &outbound).await {
                        let _ = outbound.send(e.to_json_rpc_error(RequestId::Null).into());
                        break Err(e);
                    }
                }
                JsonRpcMessage::Notification(notification) if notification.method == CANCELLED => {
                    self.cancel(notification.params).await;
                }
                other => {
                    self.handler.handle_message(other).await;
                }
            }
        };

        match &outcome {
            Ok(()) => tracing::info!("Session closed"),
            Err(e) => tracing::warn!("Session closed: {e}"),
        }

        self.handler.close().await;
        for (id, task) in self.in_flight.lock().await.drain() {
            tracing::debug!("Aborting in-flight request {id}");
            task.abort();
        }
        drop(outbound);
        if let Err(e) = writer.await {
            tracing::error!("Writer task failed: {e}");
        }

        outcome
    }

    /// Run a request on its own task so slow handlers never stall the receive
    /// loop. Fails if the id is already in flight.
    async fn spawn_request(&self, request: JsonRpcRequest, outbound: &Outbound) -> McpResult<()> {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.contains_key(&request.id) {
            return Err(McpError::InvalidRequest(format!(
                "duplicate in-flight request id {}",
                request.id
            )));
        }

        let id = request.id.clone();
        let handler = Arc::clone(&self.handler);
        let tasks = Arc::clone(&self.in_flight);
        let outbound = outbound.clone();

        let task = tokio::spawn(
            async move {
                let id = request.id.clone();
                let method = request.method.clone();
                let response = match AssertUnwindSafe(handler.handle_request(request))
                    .catch_unwind()
                    .await
                {
                    Ok(response) => response,
                    Err(_) => {
                        tracing::error!("Handler for '{method}' panicked");
                        let message = format!("handler for '{method}' panicked");
                        let kind = BuiltinMethod::parse(&method).and_then(|m| m.capability());
                        let error = match kind {
                            Some(kind) => McpError::handler_failure(kind, message),
                            None => McpError::InternalError(message),
                        };
                        error.to_json_rpc_error(id.clone())
                    }
                };

                // Absent means the request was cancelled or the session closed.
                if tasks.lock().await.remove(&id).is_none() {
                    tracing::debug!("Discarding response to cancelled request {id}");
                    return;
                }
                let _ = outbound.send(response.into());
            }
            .in_current_span(),
        );

        in_flight.insert(id, task.abort_handle());
        Ok(())
    }

    async fn cancel(&self, params: Option<Value>) {
        let params: CancelledParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                tracing::warn!("Cancellation without params ignored");
                return;
            }
            Err(e) => {
                tracing::warn!("Invalid cancellation params: {e}");
                return;
            }
        };

        match self.in_flight.lock().await.remove(&params.request_id) {
            Some(task) => {
                task.abort();
                tracing::info!(
                    "Cancelled request {} ({})",
                    params.request_id,
                    params.reason.as_deref().unwrap_or("no reason given")
                );
            }
            None => tracing::debug!(
                "Cancellation for unknown or completed request {}",
                params.request_id
            ),
        }
    }
}

/// Encode and write outbound envelopes until every sender is gone, then
/// close the sink.
pub(crate) async fn write_frames<S: FrameSink>(
    mut sink: S,
    mut outbound: mpsc::UnboundedReceiver<JsonRpcMessage>,
    codec: Codec,
) {
    while let Some(message) = outbound.recv().await {
        let frame = match codec.encode(&message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode outbound message: {e}");
                continue;
            }
        };
        if let Err(e) = sink.send(frame).await {
            tracing::warn!("Failed to write frame: {e}");
            break;
        }
    }
    if let Err(e) = sink.close().await {
        tracing::debug!("Error closing transport: {e}");
    }
}


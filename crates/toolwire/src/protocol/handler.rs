//! Server-side request dispatcher: routes each request to a built-in method
//! or to the capability registry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::registry::CapabilityRegistry;
use crate::session::SessionState;
use crate::types::notification::INITIALIZED;
use crate::types::*;

use super::methods::BuiltinMethod;
use super::negotiation::NegotiatedCapabilities;

/// Dispatcher for one connection. The registry is shared across connections;
/// the negotiated capabilities are not.
pub struct ProtocolHandler {
    registry: Arc<CapabilityRegistry>,
    config: Arc<ServerConfig>,
    capabilities: Mutex<NegotiatedCapabilities>,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<CapabilityRegistry>, config: Arc<ServerConfig>) -> Self {
        Self {
            registry,
            config,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
        }
    }

    /// Handle any inbound envelope. Only requests produce a response.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<JsonRpcResponse> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            JsonRpcMessage::Response(resp) => {
                tracing::warn!("Ignoring unsolicited response with id {}", resp.id);
                None
            }
        }
    }

    /// Always yields exactly one response carrying the request's id.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let method = request.method.clone();

        match self.dispatch_request(request).await {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::debug!("Request {id} ({method}) failed: {e}");
                e.to_json_rpc_error(id)
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let builtin = BuiltinMethod::parse(&request.method);
        if builtin == Some(BuiltinMethod::Initialize) {
            return self.handle_initialize(request.params).await;
        }

        let negotiated = {
            let caps = self.capabilities.lock().await;
            caps.state.require_active(&request.method)?;
            caps.kinds.clone()
        };

        let method = builtin.ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;
        if let Some(kind) = method.capability() {
            if !negotiated.contains(&kind) {
                return Err(McpError::MethodNotFound(format!(
                    "{method} ({} capability was not negotiated)",
                    kind.capability_key()
                )));
            }
        }

        match method {
            BuiltinMethod::Initialize => self.handle_initialize(request.params).await,
            BuiltinMethod::Ping => Ok(Value::Object(serde_json::Map::new())),

            BuiltinMethod::ToolsList => to_value(ToolListResult {
                tools: self.registry.list_tools(),
                next_cursor: None,
            }),
            BuiltinMethod::ToolsCall => {
                let params: ToolCallParams = required_params(request.params, "Tool call")?;
                let arguments = params
                    .arguments
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                self.registry
                    .invoke(CapabilityKind::Tool, &params.name, arguments)
                    .await
                    .map_err(|e| e.into_handler_failure(CapabilityKind::Tool))
            }

            BuiltinMethod::ResourcesList => to_value(ResourceListResult {
                resources: self.registry.list_resources(),
                next_cursor: None,
            }),
            BuiltinMethod::ResourcesRead => {
                let params: ResourceReadParams = required_params(request.params, "Resource read")?;
                self.registry
                    .invoke(CapabilityKind::Resource, &params.uri, Value::Null)
                    .await
                    .map_err(|e| e.into_handler_failure(CapabilityKind::Resource))
            }

            BuiltinMethod::PromptsList => to_value(PromptListResult {
                prompts: self.registry.list_prompts(),
                next_cursor: None,
            }),
            BuiltinMethod::PromptsGet => {
                let params: PromptGetParams = required_params(request.params, "Prompt get")?;
                let arguments = params
                    .arguments
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                self.registry
                    .invoke(CapabilityKind::Prompt, &params.name, arguments)
                    .await
                    .map_err(|e| e.into_handler_failure(CapabilityKind::Prompt))
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = required_params(params, "Initialize")?;

        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params, &self.config)?;

        to_value(result)
    }

    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            INITIALIZED => {
                let mut caps = self.capabilities.lock().await;
                if caps.state.is_active() {
                    caps.mark_initialized();
                } else {
                    tracing::warn!("Ignoring '{INITIALIZED}' before the handshake completed");
                }
            }
            other => {
                tracing::debug!("Unhandled notification: {other}");
            }
        }
    }

    pub async fn state(&self) -> SessionState {
        self.capabilities.lock().await.state
    }

    pub async fn is_closed(&self) -> bool {
        self.capabilities.lock().await.state.is_closed()
    }

    /// Returns `false` if the session was already closed.
    pub async fn close(&self) -> bool {
        self.capabilities.lock().await.state.close()
    }

    pub async fn negotiated(&self) -> NegotiatedCapabilities {
        self.capabilities.lock().await.clone()
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}

fn to_value<T: Serialize>(result: T) -> McpResult<Value> {
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

//! Server-side capability negotiation during initialization.

use crate::config::ServerConfig;
use crate::session::SessionState;
use crate::types::{
    CapabilityKind, ClientCapabilities, Implementation, InitializeParams, InitializeResult,
    McpError, McpResult, ServerCapabilities,
};

/// Handshake state and the outcome of negotiation for one connection.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub state: SessionState,
    pub protocol_version: Option<String>,
    pub client: ClientCapabilities,
    pub client_info: Option<Implementation>,
    /// Intersection of what the client requested and the server offers.
    pub kinds: Vec<CapabilityKind>,
    /// Set once `notifications/initialized` arrives.
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    pub fn negotiate(
        &mut self,
        params: InitializeParams,
        config: &ServerConfig,
    ) -> McpResult<InitializeResult> {
        self.state.begin_negotiation()?;

        if !config.supported_versions.contains(&params.protocol_version) {
            tracing::warn!(
                "Client requested protocol version {}, server supports {:?}. Closing session.",
                params.protocol_version,
                config.supported_versions
            );
            self.state.close();
            return Err(McpError::ProtocolVersionMismatch {
                requested: params.protocol_version,
                supported: config.supported_versions.clone(),
            });
        }

        self.kinds = params
            .capabilities
            .requested_kinds()
            .into_iter()
            .filter(|kind| config.offered.contains(kind))
            .collect();
        self.protocol_version = Some(params.protocol_version.clone());
        self.client = params.capabilities;
        self.client_info = params.client_info;
        self.state.activate()?;

        match &self.client_info {
            Some(info) => tracing::info!(
                "Initialized with client: {} v{} (protocol {})",
                info.name,
                info.version,
                params.protocol_version
            ),
            None => tracing::info!(
                "Initialized with anonymous client (protocol {})",
                params.protocol_version
            ),
        }

        Ok(InitializeResult {
            protocol_version: params.protocol_version,
            capabilities: ServerCapabilities::for_kinds(&self.kinds),
            server_info: config.server_info.clone(),
            instructions: config.instructions.clone(),
        })
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
        tracing::info!("MCP handshake complete");
    }

    pub fn supports(&self, kind: CapabilityKind) -> bool {
        self.kinds.contains(&kind)
    }
}

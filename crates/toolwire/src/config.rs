//! Session configuration for both ends of a connection.

use std::time::Duration;

use crate::types::{CapabilityKind, Implementation, LATEST_PROTOCOL_VERSION};

/// Default ceiling on a single frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;
/// Consecutive malformed frames tolerated before the session closes.
pub const DEFAULT_MAX_MALFORMED_FRAMES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Protocol versions accepted during the handshake.
    pub supported_versions: Vec<String>,
    pub server_info: Implementation,
    pub instructions: Option<String>,
    /// Capability kinds this server is willing to negotiate.
    pub offered: Vec<CapabilityKind>,
    pub max_malformed_frames: u32,
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            supported_versions: vec![LATEST_PROTOCOL_VERSION.to_string()],
            server_info: Implementation {
                name: "toolwire".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
            offered: CapabilityKind::ALL.to_vec(),
            max_malformed_frames: DEFAULT_MAX_MALFORMED_FRAMES,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_server_info(mut self, name: &str, version: &str) -> Self {
        self.server_info = Implementation {
            name: name.to_string(),
            version: version.to_string(),
        };
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub protocol_version: String,
    /// Versions the client accepts back from the server.
    pub supported_versions: Vec<String>,
    pub client_info: Implementation,
    /// Empty means "everything the server offers".
    pub requested: Vec<CapabilityKind>,
    pub request_timeout: Duration,
    pub max_malformed_frames: u32,
    pub max_frame_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            supported_versions: vec![LATEST_PROTOCOL_VERSION.to_string()],
            client_info: Implementation {
                name: "toolwire-client".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            requested: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_malformed_frames: DEFAULT_MAX_MALFORMED_FRAMES,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ClientConfig {
    /// Speak exactly `version`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.supported_versions = vec![version.clone()];
        self.protocol_version = version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn requesting(mut self, kinds: &[CapabilityKind]) -> Self {
        self.requested = kinds.to_vec();
        self
    }
}

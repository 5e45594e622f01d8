//! MCP capability and initialization types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LATEST_PROTOCOL_VERSION: &str = "2024-11-05";

/// The three kinds of capability a server can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Tool,
        CapabilityKind::Resource,
        CapabilityKind::Prompt,
    ];

    /// Key used for this kind in capability objects and method prefixes.
    pub fn capability_key(self) -> &'static str {
        match self {
            CapabilityKind::Tool => "tools",
            CapabilityKind::Resource => "resources",
            CapabilityKind::Prompt => "prompts",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityKind::Tool => write!(f, "Tool"),
            CapabilityKind::Resource => write!(f, "Resource"),
            CapabilityKind::Prompt => write!(f, "Prompt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Capabilities a client declares in `initialize`.
///
/// The `tools`/`resources`/`prompts` keys state which server capability kinds
/// the client is interested in. A client that names none of them is treated
/// as interested in all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingCapability {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    #[serde(default)]
    pub subscribe: bool,
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<Implementation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ClientCapabilities {
    /// Capabilities requesting exactly the given kinds.
    pub fn requesting(kinds: &[CapabilityKind]) -> Self {
        let mut caps = Self::default();
        for kind in kinds {
            match kind {
                CapabilityKind::Tool => caps.tools = Some(ToolsCapability::default()),
                CapabilityKind::Resource => {
                    caps.resources = Some(ResourcesCapability::default())
                }
                CapabilityKind::Prompt => caps.prompts = Some(PromptsCapability::default()),
            }
        }
        caps
    }

    pub fn requested_kinds(&self) -> Vec<CapabilityKind> {
        let kinds: Vec<CapabilityKind> = CapabilityKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                CapabilityKind::Tool => self.tools.is_some(),
                CapabilityKind::Resource => self.resources.is_some(),
                CapabilityKind::Prompt => self.prompts.is_some(),
            })
            .collect();

        if kinds.is_empty() {
            CapabilityKind::ALL.to_vec()
        } else {
            kinds
        }
    }
}

impl ServerCapabilities {
    pub fn for_kinds(kinds: &[CapabilityKind]) -> Self {
        Self {
            experimental: None,
            prompts: kinds
                .contains(&CapabilityKind::Prompt)
                .then(PromptsCapability::default),
            resources: kinds
                .contains(&CapabilityKind::Resource)
                .then(ResourcesCapability::default),
            tools: kinds
                .contains(&CapabilityKind::Tool)
                .then(ToolsCapability::default),
        }
    }

    pub fn supports(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::Tool => self.tools.is_some(),
            CapabilityKind::Resource => self.resources.is_some(),
            CapabilityKind::Prompt => self.prompts.is_some(),
        }
    }

    pub fn kinds(&self) -> Vec<CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_client_capabilities_request_everything() {
        let caps: ClientCapabilities = serde_json::from_value(json!({})).unwrap();
        assert_eq!(caps.requested_kinds(), CapabilityKind::ALL.to_vec());
    }

    #[test]
    fn named_kinds_narrow_the_request() {
        let caps: ClientCapabilities =
            serde_json::from_value(json!({"tools": {}, "roots": {"listChanged": true}})).unwrap();
        assert_eq!(caps.requested_kinds(), vec![CapabilityKind::Tool]);
    }

    #[test]
    fn server_capabilities_serialize_only_offered_kinds() {
        let caps = ServerCapabilities::for_kinds(&[CapabilityKind::Tool, CapabilityKind::Prompt]);
        let value = serde_json::to_value(&caps).unwrap();
        assert!(value.get("tools").is_some());
        assert!(value.get("prompts").is_some());
        assert!(value.get("resources").is_none());
        assert_eq!(caps.kinds(), vec![CapabilityKind::Tool, CapabilityKind::Prompt]);
    }

    #[test]
    fn initialize_params_accept_missing_client_info() {
        let params: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {}
        }))
        .unwrap();
        assert!(params.client_info.is_none());
    }
}

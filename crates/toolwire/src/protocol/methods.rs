//! The closed set of built-in request methods.

use crate::types::CapabilityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMethod {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
}

impl BuiltinMethod {
    pub fn parse(method: &str) -> Option<Self> {
        Some(match method {
            "initialize" => BuiltinMethod::Initialize,
            "ping" => BuiltinMethod::Ping,
            "tools/list" => BuiltinMethod::ToolsList,
            "tools/call" => BuiltinMethod::ToolsCall,
            "resources/list" => BuiltinMethod::ResourcesList,
            "resources/read" => BuiltinMethod::ResourcesRead,
            "prompts/list" => BuiltinMethod::PromptsList,
            "prompts/get" => BuiltinMethod::PromptsGet,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinMethod::Initialize => "initialize",
            BuiltinMethod::Ping => "ping",
            BuiltinMethod::ToolsList => "tools/list",
            BuiltinMethod::ToolsCall => "tools/call",
            BuiltinMethod::ResourcesList => "resources/list",
            BuiltinMethod::ResourcesRead => "resources/read",
            BuiltinMethod::PromptsList => "prompts/list",
            BuiltinMethod::PromptsGet => "prompts/get",
        }
    }

    /// The capability kind that must be negotiated before this method is served.
    pub fn capability(self) -> Option<CapabilityKind> {
        match self {
            BuiltinMethod::Initialize | BuiltinMethod::Ping => None,
            BuiltinMethod::ToolsList | BuiltinMethod::ToolsCall => Some(CapabilityKind::Tool),
            BuiltinMethod::ResourcesList | BuiltinMethod::ResourcesRead => {
                Some(CapabilityKind::Resource)
            }
            BuiltinMethod::PromptsList | BuiltinMethod::PromptsGet => Some(CapabilityKind::Prompt),
        }
    }
}

impl std::fmt::Display for BuiltinMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

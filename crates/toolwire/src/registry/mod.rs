//! Capability registration and lookup.
//!
//! The registry is built before the server starts and is shared read-only
//! (behind an `Arc`) by every connection afterwards.

pub mod handler;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::types::{
    CapabilityKind, McpError, McpResult, PromptDefinition, ResourceDefinition, ToolDefinition,
};

pub use handler::{
    prompt_fn, resource_fn, tool_fn, PromptHandler, ResourceHandler, ToolHandler,
};

/// Public description of a capability, as returned by the `*/list` methods.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityDescriptor {
    Tool(ToolDefinition),
    Resource(ResourceDefinition),
    Prompt(PromptDefinition),
}

impl CapabilityDescriptor {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            CapabilityDescriptor::Tool(_) => CapabilityKind::Tool,
            CapabilityDescriptor::Resource(_) => CapabilityKind::Resource,
            CapabilityDescriptor::Prompt(_) => CapabilityKind::Prompt,
        }
    }

    /// Lookup key: the tool or prompt name, or the resource URI.
    pub fn name(&self) -> &str {
        match self {
            CapabilityDescriptor::Tool(def) => &def.name,
            CapabilityDescriptor::Resource(def) => &def.uri,
            CapabilityDescriptor::Prompt(def) => &def.name,
        }
    }
}

#[derive(Clone)]
pub enum Handler {
    Tool(Arc<dyn ToolHandler>),
    Resource(Arc<dyn ResourceHandler>),
    Prompt(Arc<dyn PromptHandler>),
}

impl Handler {
    fn kind(&self) -> CapabilityKind {
        match self {
            Handler::Tool(_) => CapabilityKind::Tool,
            Handler::Resource(_) => CapabilityKind::Resource,
            Handler::Prompt(_) => CapabilityKind::Prompt,
        }
    }
}

struct Entry {
    descriptor: CapabilityDescriptor,
    handler: Handler,
}

#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<Entry>,
    index: HashMap<(CapabilityKind, String), usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: CapabilityDescriptor,
        handler: Handler,
    ) -> McpResult<()> {
        let kind = descriptor.kind();
        if handler.kind() != kind {
            return Err(McpError::InternalError(format!(
                "{} handler registered for {} '{}'",
                handler.kind(),
                kind,
                descriptor.name()
            )));
        }

        let key = (kind, descriptor.name().to_string());
        if self.index.contains_key(&key) {
            return Err(McpError::DuplicateCapability { kind, name: key.1 });
        }

        tracing::debug!("Registered {kind} '{}'", key.1);
        self.index.insert(key, self.entries.len());
        self.entries.push(Entry {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn register_tool(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> McpResult<()> {
        self.register(
            CapabilityDescriptor::Tool(definition),
            Handler::Tool(handler),
        )
    }

    pub fn register_resource(
        &mut self,
        definition: ResourceDefinition,
        handler: Arc<dyn ResourceHandler>,
    ) -> McpResult<()> {
        self.register(
            CapabilityDescriptor::Resource(definition),
            Handler::Resource(handler),
        )
    }

    pub fn register_prompt(
        &mut self,
        definition: PromptDefinition,
        handler: Arc<dyn PromptHandler>,
    ) -> McpResult<()> {
        self.register(
            CapabilityDescriptor::Prompt(definition),
            Handler::Prompt(handler),
        )
    }

    /// Descriptors of one kind, in registration order.
    pub fn list(&self, kind: CapabilityKind) -> Vec<CapabilityDescriptor> {
        self.entries
            .iter()
            .filter(|entry| entry.descriptor.kind() == kind)
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.descriptor {
                CapabilityDescriptor::Tool(def) => Some(def.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.descriptor {
                CapabilityDescriptor::Resource(def) => Some(def.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.descriptor {
                CapabilityDescriptor::Prompt(def) => Some(def.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        self.index.contains_key(&(kind, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the handler registered under `name`. Resource handlers receive
    /// `name` as the URI and ignore `arguments`.
    pub async fn invoke(
        &self,
        kind: CapabilityKind,
        name: &str,
        arguments: Value,
    ) -> McpResult<Value> {
        let entry = self
            .index
            .get(&(kind, name.to_string()))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| McpError::CapabilityNotFound {
                kind,
                name: name.to_string(),
            })?;

        match &entry.handler {
            Handler::Tool(handler) => handler.call(arguments).await,
            Handler::Resource(handler) => {
                let result = handler.read(name).await?;
                serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
            }
            Handler::Prompt(handler) => {
                let result = handler.get(arguments).await?;
                serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptGetResult, ReadResourceResult, ResourceContent};
    use serde_json::json;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: None,
            input_schema: json!({"type": "object"}),
        }
    }

    fn echo() -> Arc<dyn ToolHandler> {
        tool_fn(|args| async move { Ok(args) })
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = CapabilityRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register_tool(tool(name), echo()).unwrap();
        }
        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.list(CapabilityKind::Tool).len(), 3);
        assert!(registry.list(CapabilityKind::Prompt).is_empty());
    }

    #[test]
    fn duplicate_name_within_a_kind_is_rejected() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool(tool("add"), echo()).unwrap();
        let err = registry.register_tool(tool("add"), echo()).unwrap_err();
        assert!(matches!(
            err,
            McpError::DuplicateCapability { kind: CapabilityKind::Tool, ref name } if name == "add"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_in_different_kinds_is_allowed() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool(tool("summary"), echo()).unwrap();
        registry
            .register_prompt(
                PromptDefinition {
                    name: "summary".to_string(),
                    description: None,
                    arguments: None,
                },
                prompt_fn(|_| async {
                    Ok(PromptGetResult::user_text(None, "Summarize.".to_string()))
                }),
            )
            .unwrap();
        assert!(registry.contains(CapabilityKind::Tool, "summary"));
        assert!(registry.contains(CapabilityKind::Prompt, "summary"));
    }

    #[test]
    fn mismatched_handler_kind_is_rejected() {
        let mut registry = CapabilityRegistry::new();
        let err = registry
            .register(CapabilityDescriptor::Tool(tool("x")), Handler::Prompt(prompt_fn(|_| async {
                Ok(PromptGetResult::user_text(None, String::new()))
            })))
            .unwrap_err();
        assert!(matches!(err, McpError::InternalError(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn invoke_delegates_to_the_handler() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool(tool("echo"), echo()).unwrap();
        registry
            .register_resource(
                ResourceDefinition {
                    uri: "mem://a".to_string(),
                    name: "a".to_string(),
                    description: None,
                    mime_type: None,
                },
                resource_fn(|uri| async move {
                    Ok(ReadResourceResult {
                        contents: vec![ResourceContent::text(uri, Some("text/plain"), "A")],
                    })
                }),
            )
            .unwrap();

        let out = registry
            .invoke(CapabilityKind::Tool, "echo", json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(out, json!({"x": 1}));

        let out = registry
            .invoke(CapabilityKind::Resource, "mem://a", Value::Null)
            .await
            .unwrap();
        assert_eq!(out["contents"][0]["uri"], "mem://a");
        assert_eq!(out["contents"][0]["text"], "A");
    }

    #[tokio::test]
    async fn invoke_unknown_name_is_capability_not_found() {
        let registry = CapabilityRegistry::new();
        let err = registry
            .invoke(CapabilityKind::Resource, "file:///missing", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::types::mcp_error_codes::CAPABILITY_NOT_FOUND);
    }

    #[tokio::test]
    async fn handler_errors_propagate_unchanged() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_tool(
                tool("fail"),
                tool_fn(|_| async { Err(McpError::ToolExecutionError("boom".to_string())) }),
            )
            .unwrap();
        let err = registry
            .invoke(CapabilityKind::Tool, "fail", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::ToolExecutionError(ref m) if m == "boom"));
    }
}

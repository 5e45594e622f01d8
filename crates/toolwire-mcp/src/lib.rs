//! toolwire-mcp — a runnable MCP server and client on the toolwire engine.

pub mod config;
pub mod demo;
pub mod prompts;
pub mod repl;
pub mod resources;
pub mod tools;

use std::path::Path;

use toolwire::{CapabilityRegistry, McpResult, ServerConfig};

pub use config::{resolve_addr, resolve_timeout, resolve_url};

pub const SERVER_NAME: &str = "toolwire-mcp";

/// The sample tools, resources and prompts, plus any files under `resource_dir`.
pub fn build_registry(resource_dir: Option<&Path>) -> McpResult<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    tools::register_all(&mut registry)?;
    resources::register_all(&mut registry, resource_dir)?;
    prompts::register_all(&mut registry)?;
    Ok(registry)
}

pub fn server_config() -> ServerConfig {
    ServerConfig::default()
        .with_server_info(SERVER_NAME, env!("CARGO_PKG_VERSION"))
        .with_instructions("Sample MCP server: add_numbers, file resources, summarize_resource.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolwire::CapabilityKind;

    #[test]
    fn registry_carries_every_sample_capability() {
        let registry = build_registry(None).unwrap();
        assert!(registry.contains(CapabilityKind::Tool, tools::add_numbers::NAME));
        assert!(registry.contains(CapabilityKind::Resource, resources::example::URI));
        assert!(registry.contains(CapabilityKind::Prompt, prompts::summarize::NAME));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn example_file_in_resource_dir_does_not_clash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("example.txt"), "shadow").unwrap();
        std::fs::write(dir.path().join("notes.md"), "notes").unwrap();

        let registry = build_registry(Some(dir.path())).unwrap();
        assert_eq!(registry.list_resources().len(), 2);
    }
}

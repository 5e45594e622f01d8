//! MCP prompt implementations.

pub mod summarize;

use toolwire::{prompt_fn, CapabilityRegistry, McpResult};

pub fn register_all(registry: &mut CapabilityRegistry) -> McpResult<()> {
    registry.register_prompt(summarize::definition(), prompt_fn(summarize::expand))?;
    Ok(())
}

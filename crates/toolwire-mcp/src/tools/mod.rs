//! MCP tool implementations.

pub mod add_numbers;

use toolwire::{tool_fn, CapabilityRegistry, McpResult};

/// Register every sample tool.
pub fn register_all(registry: &mut CapabilityRegistry) -> McpResult<()> {
    registry.register_tool(add_numbers::definition(), tool_fn(add_numbers::execute))?;
    Ok(())
}

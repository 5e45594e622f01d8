//! MCP resource implementations.

pub mod directory;
pub mod example;

use std::path::Path;

use toolwire::{resource_fn, CapabilityRegistry, McpResult};

/// Register the built-in example and, when given, every file under `dir`.
pub fn register_all(registry: &mut CapabilityRegistry, dir: Option<&Path>) -> McpResult<()> {
    registry.register_resource(example::definition(), resource_fn(example::read))?;

    if let Some(dir) = dir {
        let count = directory::register_directory(registry, dir)?;
        tracing::info!("Registered {count} resource(s) from {}", dir.display());
    }
    Ok(())
}

/// File-extension based MIME type, `None` when unknown.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "json" => "application/json",
        "toml" => "application/toml",
        "yaml" | "yml" => "application/yaml",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "rs" => "text/x-rust",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_to_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.TXT")), Some("text/plain"));
        assert_eq!(mime_type_for(Path::new("notes.md")), Some("text/markdown"));
        assert_eq!(mime_type_for(Path::new("blob.bin")), None);
        assert_eq!(mime_type_for(Path::new("Makefile")), None);
    }
}

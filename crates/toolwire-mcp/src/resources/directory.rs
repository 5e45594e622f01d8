//! Directory-backed resources: every regular file in a directory becomes
//! `file:///<file name>`, read from disk on each request.

use std::path::{Path, PathBuf};

use toolwire::{
    resource_fn, CapabilityKind, CapabilityRegistry, McpError, McpResult, ReadResourceResult,
    ResourceContent, ResourceDefinition,
};

use super::mime_type_for;

/// Register the regular files directly under `dir`, sorted by name.
/// Returns how many were registered. Names already taken are skipped.
pub fn register_directory(registry: &mut CapabilityRegistry, dir: &Path) -> McpResult<usize> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut registered = 0;
    for path in files {
        let Some(name) = path.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            tracing::warn!("Skipping non UTF-8 file name {}", path.display());
            continue;
        };
        let uri = format!("file:///{name}");
        if registry.contains(CapabilityKind::Resource, &uri) {
            tracing::warn!("Skipping {}: {uri} is already registered", path.display());
            continue;
        }

        let definition = ResourceDefinition {
            uri,
            name,
            description: Some(format!("File {}", path.display())),
            mime_type: mime_type_for(&path).map(str::to_string),
        };
        let handler = resource_fn(move |uri| read_file(path.clone(), uri));
        registry.register_resource(definition, handler)?;
        registered += 1;
    }

    Ok(registered)
}

async fn read_file(path: PathBuf, uri: String) -> McpResult<ReadResourceResult> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| McpError::ResourceUnavailable(format!("{uri}: {e}")))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(uri, mime_type_for(&path), text)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn registers_regular_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let mut registry = CapabilityRegistry::new();
        let count = register_directory(&mut registry, dir.path()).unwrap();
        assert_eq!(count, 2);

        let uris: Vec<String> = registry.list_resources().into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["file:///a.txt", "file:///b.md"]);

        let value = registry
            .invoke(CapabilityKind::Resource, "file:///a.txt", Value::Null)
            .await
            .unwrap();
        assert_eq!(value["contents"][0]["text"], json!("alpha"));
        assert_eq!(value["contents"][0]["mimeType"], json!("text/plain"));
    }

    #[tokio::test]
    async fn vanished_file_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, "soon gone").unwrap();

        let mut registry = CapabilityRegistry::new();
        register_directory(&mut registry, dir.path()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = registry
            .invoke(CapabilityKind::Resource, "file:///gone.txt", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::ResourceUnavailable(_)));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut registry = CapabilityRegistry::new();
        let err = register_directory(&mut registry, Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, McpError::Io(_)));
    }
}

//! Resource: file:///example.txt — a static text file.

use toolwire::{McpResult, ReadResourceResult, ResourceContent, ResourceDefinition};

pub const URI: &str = "file:///example.txt";
pub const TEXT: &str = "Hello, this is the content of example.txt!";
const MIME_TYPE: &str = "text/plain";

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        uri: URI.to_string(),
        name: "Example Text File".to_string(),
        description: Some("A static example text file.".to_string()),
        mime_type: Some(MIME_TYPE.to_string()),
    }
}

pub async fn read(uri: String) -> McpResult<ReadResourceResult> {
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(uri, Some(MIME_TYPE), TEXT)],
    })
}

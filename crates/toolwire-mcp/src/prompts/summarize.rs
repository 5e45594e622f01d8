//! Prompt: summarize_resource — Ask the model to summarize a resource.

use serde_json::Value;

use toolwire::{McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult};

pub const NAME: &str = "summarize_resource";

pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: NAME.to_string(),
        description: Some("Summarize the contents of a resource".to_string()),
        arguments: Some(vec![
            PromptArgument {
                name: "uri".to_string(),
                description: Some("URI of the resource to summarize".to_string()),
                required: true,
            },
            PromptArgument {
                name: "style".to_string(),
                description: Some("Summary style, e.g. 'bullets' or 'paragraph'".to_string()),
                required: false,
            },
        ]),
    }
}

pub async fn expand(args: Value) -> McpResult<PromptGetResult> {
    let uri = args
        .get("uri")
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams("'uri' argument is required".to_string()))?;
    let style = args
        .get("style")
        .and_then(Value::as_str)
        .unwrap_or("paragraph");

    let text = format!(
        "Summarize the resource {uri}.\n\n\
         Please:\n\
         1. Read it with resources/read using uri \"{uri}\"\n\
         2. Summarize its contents as a {style}\n\
         3. Call out anything that looks incomplete or inconsistent"
    );

    Ok(PromptGetResult::user_text(
        Some(format!("Summary request for {uri}")),
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolwire::Content;

    #[tokio::test]
    async fn expands_with_the_uri() {
        let result = expand(json!({"uri": "file:///example.txt"})).await.unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].role, "user");
        match &result.messages[0].content {
            Content::Text { text } => {
                assert!(text.contains("file:///example.txt"));
                assert!(text.contains("paragraph"));
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_uri_is_invalid_params() {
        let err = expand(json!({"style": "bullets"})).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}

//! Tool: add_numbers — Add two numbers together.

use serde::Deserialize;
use serde_json::{json, Number, Value};

use toolwire::{McpError, McpResult, ToolDefinition};

pub const NAME: &str = "add_numbers";

#[derive(Debug, Deserialize)]
struct AddParams {
    a: Number,
    b: Number,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some("Adds two numbers together.".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "First number"},
                "b": {"type": "number", "description": "Second number"}
            },
            "required": ["a", "b"]
        }),
    }
}

/// Integer inputs produce an integer sum; anything else is summed as `f64`.
pub async fn execute(args: Value) -> McpResult<Value> {
    let params: AddParams = serde_json::from_value(args)
        .map_err(|e| McpError::InvalidParams(format!("'a' and 'b' must be numbers: {e}")))?;

    if let (Some(a), Some(b)) = (params.a.as_i64(), params.b.as_i64()) {
        let sum = a
            .checked_add(b)
            .ok_or_else(|| McpError::ToolExecutionError(format!("{a} + {b} overflows")))?;
        return Ok(json!({ "sum": sum }));
    }

    let a = params.a.as_f64().unwrap_or(f64::NAN);
    let b = params.b.as_f64().unwrap_or(f64::NAN);
    let sum = Number::from_f64(a + b)
        .ok_or_else(|| McpError::ToolExecutionError(format!("{a} + {b} is not finite")))?;

    Ok(json!({ "sum": sum }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn integers_stay_integers() {
        let out = execute(json!({"a": 5, "b": 7})).await.unwrap();
        assert_eq!(out, json!({"sum": 12}));
    }

    #[tokio::test]
    async fn floats_are_summed() {
        let out = execute(json!({"a": 1.5, "b": 2})).await.unwrap();
        assert_eq!(out, json!({"sum": 3.5}));
    }

    #[tokio::test]
    async fn missing_operand_is_invalid_params() {
        let err = execute(json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn string_operand_is_invalid_params() {
        let err = execute(json!({"a": "1", "b": 2})).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn overflow_is_an_execution_error() {
        let err = execute(json!({"a": i64::MAX, "b": 1})).await.unwrap_err();
        assert!(matches!(err, McpError::ToolExecutionError(_)));
    }

    #[test]
    fn schema_requires_both_operands() {
        let def = definition();
        assert_eq!(def.input_schema["required"], json!(["a", "b"]));
    }
}

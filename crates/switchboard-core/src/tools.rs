//! Tool definitions exposed to the planning model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the planning model may call, described in JSON Schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Helper function to create a JSON schema for tool input
pub fn json_schema(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_shape() {
        let schema = json_schema(
            serde_json::json!({
                "agents": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            }),
            vec!["agents"],
        );

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["agents"]["type"], "array");
        assert_eq!(schema["required"][0], "agents");
    }

    #[test]
    fn test_tool_definition_serde_roundtrip() {
        let def = ToolDefinition {
            name: "select_agents".to_string(),
            description: "Pick the agents for a request".to_string(),
            input_schema: json_schema(serde_json::json!({}), vec![]),
        };

        let json = serde_json::to_string(&def).unwrap();
        let parsed: ToolDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "select_agents");
        assert_eq!(parsed.input_schema["type"], "object");
    }
}

//! MCP-backed tool host.

use super::{McpClient, ToolError, ToolHost};
use crate::model::ToolSpec;
use rmcp::model::Tool;
use serde_json::{Map, Value};
use std::path::Path;

impl From<Tool> for ToolSpec {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

/// Tool host backed by an MCP server.
pub struct McpToolHost {
    client: McpClient,
}

impl McpToolHost {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }

    /// Spawn the MCP server at `path` and wrap it.
    pub async fn spawn(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        Ok(Self::new(McpClient::spawn_script(path).await?))
    }

    pub async fn shutdown(self) -> Result<(), ToolError> {
        self.client.shutdown().await
    }
}

impl ToolHost for McpToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let tools = self.client.list_tools().await?;
        Ok(tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let result = self.client.call_tool(name, Some(arguments)).await?;

        if result.is_error.unwrap_or(false) {
            let message = result
                .content
                .iter()
                .filter_map(|c| c.as_text().map(|t| t.text.as_str()))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ToolError::Execution(message));
        }

        serde_json::to_value(&result.content)
            .map_err(|e| ToolError::Execution(format!("serialize result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn tool_converts_to_spec() {
        let schema = json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        });
        let Value::Object(schema_map) = schema.clone() else {
            unreachable!()
        };
        let tool = Tool::new("search_posts", "Search for posts", Arc::new(schema_map));

        let spec = ToolSpec::from(tool);
        assert_eq!(spec.name, "search_posts");
        assert_eq!(spec.description, "Search for posts");
        assert_eq!(spec.schema, schema);
    }
}

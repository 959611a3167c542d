//! Tool registry for the oracle's callable tools.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::context::ToolContext;
use crate::llm::ToolDefinition;
use crate::tools::builtin::tarot_tools;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Registry of available tools.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Registry preloaded with the four tarot tools.
    pub fn with_tarot_tools() -> Self {
        let registry = Self::new();
        for tool in tarot_tools() {
            registry.register_sync(tool);
        }
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.write().await.insert(name.clone(), tool);
        tracing::debug!("Registered tool: {}", name);
    }

    /// Register a tool (sync version for startup).
    pub fn register_sync(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if let Ok(mut tools) = self.tools.try_write() {
            tools.insert(name.clone(), tool);
            tracing::debug!("Registered tool: {}", name);
        }
    }

    /// Get a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    /// Check if a tool exists.
    pub async fn has(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// List all tool names, sorted.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.try_read().map(|t| t.len()).unwrap_or(0)
    }

    /// Get tool definitions for LLM function calling, sorted by name.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Look up and run a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .await
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let start = Instant::now();
        let result = tool.execute(params, ctx).await;
        match &result {
            Ok(_) => tracing::debug!(
                tool = %name,
                turn_id = %ctx.turn_id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Tool executed"
            ),
            Err(e) => tracing::warn!(tool = %name, error = %e, "Tool failed"),
        }
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct MockTool {
        name: String,
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "A mock tool for testing"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _params: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("mock", Duration::from_millis(1)))
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ToolRegistry::new();
        let tool = Arc::new(MockTool {
            name: "test_tool".to_string(),
        });

        registry.register(tool).await;
        assert!(registry.has("test_tool").await);
        assert!(!registry.has("nonexistent").await);

        let retrieved = registry.get("test_tool").await;
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().name(), "test_tool");
    }

    #[tokio::test]
    async fn test_tarot_tools_registered() {
        let registry = ToolRegistry::with_tarot_tools();
        assert_eq!(registry.count(), 4);
        assert_eq!(
            registry.list().await,
            vec![
                "draw_celtic_cross_spread",
                "draw_single_card",
                "draw_three_card_spread",
                "show_interactive_deck",
            ]
        );

        let defs = registry.tool_definitions().await;
        assert_eq!(defs.len(), 4);
        assert!(defs.iter().all(|d| d.parameters["type"] == "object"));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("nope", serde_json::json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(MockTool {
                name: "echo".to_string(),
            }))
            .await;
        let out = registry
            .execute("echo", serde_json::json!({}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out.to_content(), "mock");
    }
}

//! Tool registry for managing available tools

use crate::Tool;
use crew_llm::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for managing tools
///
/// Tools are keyed by name; registering a second tool with the same name
/// replaces the first. Iteration order is by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if tools.insert(tool.name().to_string(), tool).is_some() {
            tracing::debug!("Replaced previously registered tool");
        }
    }

    /// Register a tool, builder style
    #[must_use]
    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Copy every tool of `other` into this registry
    pub fn extend_from(&self, other: &ToolRegistry) {
        for tool in other.list_tools() {
            self.register(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.get(name).cloned()
    }

    /// List all registered tools, ordered by name
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.values().cloned().collect()
    }

    /// Registered tool names, ordered
    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.keys().cloned().collect()
    }

    /// Tool definitions to send to the LLM, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools()
            .iter()
            .map(|tool| tool.definition())
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTool;
    use serde_json::json;

    fn tool(name: &'static str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            "test tool",
            json!({"type": "object"}),
            |_| async { Ok::<_, crew_core::Error>(json!("ok")) },
        ))
    }

    #[test]
    fn test_definitions_are_name_ordered() {
        let registry = ToolRegistry::new()
            .with_tool(tool("yahoo_finance"))
            .with_tool(tool("duckduckgo_news_search"));

        let names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["duckduckgo_news_search", "yahoo_finance"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = ToolRegistry::new();
        registry.register(tool("yahoo_finance"));
        registry.register(tool("yahoo_finance"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_extend_from() {
        let base = ToolRegistry::new().with_tool(tool("a"));
        let extra = ToolRegistry::new().with_tool(tool("b"));
        base.extend_from(&extra);

        assert_eq!(base.names(), vec!["a", "b"]);
        assert!(base.get("b").is_some());
        assert!(base.get("c").is_none());
        assert_eq!(extra.len(), 1);
    }
}

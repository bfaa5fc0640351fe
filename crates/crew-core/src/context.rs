//! Execution context for agents
//!
//! The `Context` struct is a key-value store that travels with a crew run.
//! It carries the run id, the task currently being executed and the kickoff
//! inputs so that agents and tools can correlate their work.

use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Identifier of the crew run (one per kickoff)
    pub const RUN_ID: &str = "run_id";
    /// Name of the task being executed
    pub const TASK_NAME: &str = "task_name";
    /// Kickoff inputs as a JSON object
    pub const INPUTS: &str = "inputs";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use crew_core::Context;
///
/// let mut ctx = Context::new().with_input("ticket", "AAPL");
/// ctx.set_task_name("get_stock_price");
///
/// assert_eq!(ctx.task_name(), Some("get_stock_price"));
/// assert_eq!(ctx.input("ticket"), Some("AAPL"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Add a single kickoff input
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_input(key, value);
        self
    }

    // =========== Common Accessors ===========

    /// Get the run id
    pub fn run_id(&self) -> Option<&str> {
        self.get(keys::RUN_ID).and_then(|v| v.as_str())
    }

    /// Get the current task name
    pub fn task_name(&self) -> Option<&str> {
        self.get(keys::TASK_NAME).and_then(|v| v.as_str())
    }

    /// Set the current task name
    pub fn set_task_name(&mut self, name: impl Into<String>) {
        self.insert(keys::TASK_NAME, serde_json::json!(name.into()));
    }

    /// Get a kickoff input by key
    pub fn input(&self, key: &str) -> Option<&str> {
        self.get(keys::INPUTS)
            .and_then(|inputs| inputs.get(key))
            .and_then(|v| v.as_str())
    }

    /// Set a kickoff input
    pub fn set_input(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let entry = self
            .data
            .entry(keys::INPUTS.to_string())
            .or_insert_with(|| serde_json::json!({}));
        if !entry.is_object() {
            *entry = serde_json::json!({});
        }
        if let Some(map) = entry.as_object_mut() {
            map.insert(key.into(), serde_json::Value::String(value.into()));
        }
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("key"), Some(&serde_json::json!("value")));
    }

    #[test]
    fn test_inputs_accumulate() {
        let mut ctx = Context::new().with_input("ticket", "AAPL");
        ctx.set_input("current_date", "2024-08-08");

        assert_eq!(ctx.input("ticket"), Some("AAPL"));
        assert_eq!(ctx.input("current_date"), Some("2024-08-08"));
        assert_eq!(ctx.input("missing"), None);
    }

    #[test]
    fn test_inputs_overwrite_non_object() {
        let mut ctx = Context::new();
        ctx.insert(keys::INPUTS, serde_json::json!("garbage"));
        ctx.set_input("ticket", "MSFT");
        assert_eq!(ctx.input("ticket"), Some("MSFT"));
    }

    #[test]
    fn test_run_and_task() {
        let mut ctx = Context::new();
        ctx.insert(keys::RUN_ID, serde_json::json!("run-1"));
        ctx.set_task_name("get_news");

        assert_eq!(ctx.run_id(), Some("run-1"));
        assert_eq!(ctx.task_name(), Some("get_news"));
    }
}

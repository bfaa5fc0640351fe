//! Tool trait definition

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::ToolDefinition;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Tools are functions that LLM agents can call to interact with the world.
/// Each tool must provide a name, description, and JSON schema for its input.
/// A returned error is not fatal to the agent: the executor hands the message
/// back to the LLM as an error tool result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match `input_schema`)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a `ToolRegistry` and match the name in `ToolDefinition`
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the LLM understand when to use this tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// // Schema for a price-history tool:
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "ticker": { "type": "string" }
    ///     },
    ///     "required": ["ticker"]
    /// });
    /// ```
    fn input_schema(&self) -> Value;

    /// Definition advertised to the LLM
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Read the first non-empty string argument among `keys`
///
/// Models sometimes pass a bare string instead of an object; that string is
/// accepted as the value of the first key.
pub fn string_arg(params: &Value, keys: &[&str]) -> Option<String> {
    if let Value::String(raw) = params {
        let raw = raw.trim();
        return (!raw.is_empty() && !keys.is_empty()).then(|| raw.to_string());
    }
    keys.iter()
        .filter_map(|key| params.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}

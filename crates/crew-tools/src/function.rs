//! Closure-backed tools

use crate::Tool;
use async_trait::async_trait;
use crew_core::Result;
use serde_json::Value;
use std::future::Future;

/// A tool whose behaviour is an async closure
///
/// # Example
///
/// ```
/// use crew_tools::{FnTool, Tool};
/// use serde_json::json;
///
/// let upper = FnTool::new(
///     "upper",
///     "Upper-case the given text",
///     json!({"type": "object", "properties": {"text": {"type": "string"}}}),
///     |params| async move {
///         let text = params["text"].as_str().unwrap_or_default().to_uppercase();
///         Ok::<_, crew_core::Error>(json!(text))
///     },
/// );
/// assert_eq!(upper.name(), "upper");
/// ```
pub struct FnTool<F> {
    name: String,
    description: String,
    schema: Value,
    func: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    /// Wrap `func` as a tool
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn execute(&self, params: Value) -> Result<Value> {
        (self.func)(params).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }
}

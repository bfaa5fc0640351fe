//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Call LLM with conversation history and available tools
//! 2. Check the reply
//! 3. If tool use requested, execute tools and loop back
//! 4. If completed, return final response
//!
//! When the iteration budget runs out the executor asks the LLM one last
//! time, without tools, for its best final answer.

use crew_core::{Error, Result};
use crew_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, RetryPolicy,
    StopReason, TokenUsage,
};
use crew_tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Prompt appended when the iteration budget is exhausted
pub const DEFAULT_FINAL_ANSWER_PROMPT: &str = "You have run out of steps. Do not use any more tools. \
Give your best final answer now, based on everything you have gathered so far.";

/// Event handler for agent execution events
///
/// Implement this trait to receive callbacks during agent execution.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _id: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _id: &str,
        _name: &str,
        _result: std::result::Result<&str, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the agent completes
    async fn on_complete(&self, _result: &str) {}

    /// Called when an error occurs
    async fn on_error(&self, _error: &str) {}
}

/// Event handler that narrates execution through `tracing`
///
/// Used for verbose agents: tool calls and final answers are logged at
/// `info` with the agent role attached.
pub struct LoggingEventHandler {
    agent: String,
}

impl LoggingEventHandler {
    /// Create a handler that tags events with `agent`
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
        }
    }
}

#[async_trait]
impl ExecutorEventHandler for LoggingEventHandler {
    async fn on_tool_start(&self, _id: &str, name: &str, input: &Value) {
        info!(agent = %self.agent, tool = %name, input = %preview(&input.to_string(), 300), "Using tool");
    }

    async fn on_tool_done(
        &self,
        _id: &str,
        name: &str,
        result: std::result::Result<&str, &str>,
        duration_ms: u64,
    ) {
        match result {
            Ok(output) => info!(
                agent = %self.agent,
                tool = %name,
                duration_ms,
                output = %preview(output, 300),
                "Tool finished"
            ),
            Err(error) => warn!(agent = %self.agent, tool = %name, duration_ms, %error, "Tool failed"),
        }
    }

    async fn on_complete(&self, result: &str) {
        info!(agent = %self.agent, answer = %preview(result, 500), "Final answer");
    }

    async fn on_error(&self, error: &str) {
        warn!(agent = %self.agent, %error, "Agent error");
    }
}

/// Shared token counter for one crew run
///
/// Clones share the same total, so delegated work is counted once.
#[derive(Debug, Clone, Default)]
pub struct UsageMeter {
    total: Arc<Mutex<TokenUsage>>,
}

impl UsageMeter {
    /// Create a new meter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add usage to the total
    pub fn record(&self, usage: TokenUsage) {
        *self.total.lock().unwrap_or_else(PoisonError::into_inner) += usage;
    }

    /// Current total
    pub fn total(&self) -> TokenUsage {
        *self.total.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of LLM round trips before the forced final answer
    pub max_iterations: usize,

    /// Model to use; empty means the provider default
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Message sent when `max_iterations` is exhausted
    pub final_answer_prompt: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            model: String::new(),
            system_prompt: None,
            max_tokens: 2048,
            temperature: Some(0.7),
            final_answer_prompt: DEFAULT_FINAL_ANSWER_PROMPT.to_string(),
        }
    }
}

/// Outcome of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Final answer text
    pub output: String,
    /// Tokens used across every LLM call of the run
    pub usage: TokenUsage,
    /// Number of LLM calls made, including the forced final one
    pub llm_calls: usize,
    /// Whether the answer came from the forced final call
    pub forced_final_answer: bool,
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    retry: RetryPolicy,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            retry: RetryPolicy::default(),
            event_handler: None,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the retry policy for LLM calls
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the event handler for receiving execution events
    #[must_use]
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the agent loop with a user message
    pub async fn run(&self, user_message: String) -> Result<ExecutionResult> {
        let result = self.run_conversation(vec![Message::user(user_message)]).await;
        if let (Err(e), Some(handler)) = (&result, &self.event_handler) {
            handler.on_error(&e.to_string()).await;
        }
        result
    }

    async fn run_conversation(&self, mut conversation: Vec<Message>) -> Result<ExecutionResult> {
        let tools = self.tool_registry.definitions();
        let mut usage = TokenUsage::default();
        let mut llm_calls = 0;

        for iteration in 1..=self.config.max_iterations {
            debug!(
                iteration,
                max_iterations = self.config.max_iterations,
                tool_count = tools.len(),
                "Agent iteration started"
            );

            let request = self.request(conversation.clone(), tools.clone());
            let response = self.complete(request).await?;
            llm_calls += 1;
            usage += response.usage;

            let message = response.message;
            conversation.push(message.clone());

            if message.has_tool_uses() {
                let results = self.execute_tools(&message).await;
                debug!(result_count = results.len(), "Tool results appended");
                conversation.push(Message::tool_results(results));
                continue;
            }

            let text = message.text().unwrap_or_default();
            match response.stop_reason {
                StopReason::MaxTokens => {
                    warn!(iteration, "LLM response truncated at the token limit");
                }
                StopReason::ToolUse => {
                    warn!(iteration, "Tool use announced without any tool call");
                }
                StopReason::EndTurn | StopReason::StopSequence => {}
            }

            info!(iteration, response_length = text.len(), "Agent completed");
            return self.finish(text, usage, llm_calls, false).await;
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Iteration budget exhausted, forcing a final answer"
        );
        conversation.push(Message::user(self.config.final_answer_prompt.clone()));
        let request = self.request(conversation, Vec::new());
        let response = self.complete(request).await?;
        usage += response.usage;

        let text = response.message.text().unwrap_or_default();
        self.finish(text, usage, llm_calls + 1, true).await
    }

    async fn finish(
        &self,
        output: String,
        usage: TokenUsage,
        llm_calls: usize,
        forced_final_answer: bool,
    ) -> Result<ExecutionResult> {
        if let Some(handler) = &self.event_handler {
            handler.on_complete(&output).await;
        }
        Ok(ExecutionResult {
            output,
            usage,
            llm_calls,
            forced_final_answer,
        })
    }

    fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<crew_llm::ToolDefinition>,
    ) -> CompletionRequest {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .tools(tools);
        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system);
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        builder.build()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self
            .retry
            .execute("llm.complete", || self.provider.complete(request.clone()))
            .await
            .map_err(|e| Error::ProcessingFailed(format!("LLM call failed: {e}")))?;

        debug!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );
        Ok(response)
    }

    /// Execute every tool call of an assistant message
    ///
    /// Failures and unknown tools become error results for the LLM.
    async fn execute_tools(&self, message: &Message) -> Vec<ContentBlock> {
        let mut results = Vec::new();

        for tool_use in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = tool_use else {
                continue;
            };

            if let Some(handler) = &self.event_handler {
                handler.on_tool_start(id, name, input).await;
            }

            let start_time = std::time::Instant::now();
            let outcome = match self.tool_registry.get(name) {
                Some(tool) => tool
                    .execute(input.clone())
                    .await
                    .map(|value| render_tool_output(&value))
                    .map_err(|e| e.to_string()),
                None => Err(format!(
                    "Tool '{name}' does not exist. Available tools: {}",
                    self.tool_registry.names().join(", ")
                )),
            };
            let duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some(handler) = &self.event_handler {
                handler
                    .on_tool_done(id, name, outcome.as_deref().map_err(String::as_str), duration_ms)
                    .await;
            }

            let block = match outcome {
                Ok(content) => {
                    debug!(tool_name = %name, duration_ms, result_length = content.len(), "Tool execution succeeded");
                    ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content,
                        is_error: None,
                    }
                }
                Err(error) => {
                    warn!(tool_name = %name, duration_ms, %error, "Tool execution failed");
                    ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: format!("Error: {error}"),
                        is_error: Some(true),
                    }
                }
            };
            results.push(block);
        }

        results
    }
}

/// Strings go to the LLM verbatim, everything else as JSON
fn render_tool_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn preview(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    if text.chars().count() > limit {
        out.push('…');
    }
    out
}

/// Builder for `AgentExecutor`
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    retry: RetryPolicy,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            retry: RetryPolicy::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the retry policy
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        Ok(AgentExecutor {
            provider,
            tool_registry: self.tool_registry,
            config: self.config,
            retry: self.retry,
            event_handler: self.event_handler,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_llm::mock::ScriptedProvider;
    use crew_llm::{LLMError, MessageContent, Role};
    use crew_tools::FnTool;
    use serde_json::json;

    fn price_tool() -> Arc<dyn crew_tools::Tool> {
        Arc::new(FnTool::new(
            "yahoo_finance",
            "Price history",
            json!({"type": "object"}),
            |params| async move {
                let ticker = params["ticker"].as_str().unwrap_or_default().to_string();
                if ticker.is_empty() {
                    Err(Error::ProcessingFailed("ticker is required".to_string()))
                } else {
                    Ok(json!({ "ticker": ticker, "trend": "up" }))
                }
            },
        ))
    }

    fn executor(provider: Arc<ScriptedProvider>, max_iterations: usize) -> AgentExecutor {
        AgentExecutor::builder()
            .provider(provider)
            .tool_registry(Arc::new(ToolRegistry::new().with_tool(price_tool())))
            .max_iterations(max_iterations)
            .system_prompt("You are a Senior stock price Analyst.")
            .retry_policy(RetryPolicy::fast())
            .build()
            .unwrap()
    }

    fn tool_result_blocks(request: &CompletionRequest) -> Vec<ContentBlock> {
        match &request.messages.last().unwrap().content {
            Some(MessageContent::Blocks(blocks)) => blocks.clone(),
            other => panic!("expected tool results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_result_flows_back() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call("call_1", "yahoo_finance", json!({"ticker": "AAPL"}))
                .with_usage(10, 5),
            CompletionResponse::text("stock='AAPL, price UP'").with_usage(20, 7),
        ]));

        let result = executor(provider.clone(), 5)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();

        assert_eq!(result.output, "stock='AAPL, price UP'");
        assert_eq!(result.llm_calls, 2);
        assert_eq!(result.usage.total(), 42);
        assert!(!result.forced_final_answer);

        let requests = provider.requests();
        assert_eq!(requests[0].system.as_deref(), Some("You are a Senior stock price Analyst."));
        assert_eq!(requests[0].tools.as_ref().unwrap()[0].name, "yahoo_finance");
        match &tool_result_blocks(&requests[1])[0] {
            ContentBlock::ToolResult { content, is_error, .. } => {
                assert!(content.contains("\"trend\":\"up\""));
                assert_eq!(*is_error, None);
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_llm() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call("call_1", "google_search", json!({})),
            CompletionResponse::text("done without it"),
        ]));

        let result = executor(provider.clone(), 5)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();
        assert_eq!(result.output, "done without it");

        match &tool_result_blocks(&provider.requests()[1])[0] {
            ContentBlock::ToolResult { content, is_error, .. } => {
                assert!(content.contains("google_search"));
                assert!(content.contains("yahoo_finance"));
                assert_eq!(*is_error, Some(true));
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_tool_does_not_abort() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call("call_1", "yahoo_finance", json!({})),
            CompletionResponse::text("recovered"),
        ]));

        let result = executor(provider.clone(), 5)
            .run("Analyze".to_string())
            .await
            .unwrap();
        assert_eq!(result.output, "recovered");

        match &tool_result_blocks(&provider.requests()[1])[0] {
            ContentBlock::ToolResult { content, .. } => {
                assert!(content.starts_with("Error:"));
                assert!(content.contains("ticker is required"));
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_iteration_cap_forces_final_answer() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call("call_1", "yahoo_finance", json!({"ticker": "AAPL"})),
            CompletionResponse::tool_call("call_2", "yahoo_finance", json!({"ticker": "AAPL"})),
            CompletionResponse::text("best effort answer"),
        ]));

        let result = executor(provider.clone(), 2)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();

        assert_eq!(result.output, "best effort answer");
        assert!(result.forced_final_answer);
        assert_eq!(result.llm_calls, 3);

        let last = provider.requests().pop().unwrap();
        assert!(last.tools.is_none());
        let final_message = last.messages.last().unwrap();
        assert_eq!(final_message.role, Role::User);
        assert_eq!(
            final_message.text().as_deref(),
            Some(DEFAULT_FINAL_ANSWER_PROMPT)
        );
    }

    #[tokio::test]
    async fn test_llm_errors_are_retried_then_fatal() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_error(LLMError::RateLimitExceeded("slow".to_string()));
        provider.push_text("after retry");

        let result = executor(provider.clone(), 3)
            .run("Analyze".to_string())
            .await
            .unwrap();
        assert_eq!(result.output, "after retry");
        assert_eq!(provider.call_count(), 2);

        let failing = Arc::new(ScriptedProvider::new());
        failing.push_error(LLMError::AuthenticationFailed);
        let err = executor(failing, 3)
            .run("Analyze".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProcessingFailed(_)));
    }

    #[test]
    fn test_usage_meter_shared_between_clones() {
        let meter = UsageMeter::new();
        let clone = meter.clone();
        clone.record(TokenUsage {
            input_tokens: 3,
            output_tokens: 4,
        });
        assert_eq!(meter.total().total(), 7);
    }

    #[test]
    fn test_render_tool_output() {
        assert_eq!(render_tool_output(&json!("plain")), "plain");
        assert_eq!(render_tool_output(&json!({"a": 1})), r#"{"a":1}"#);
    }
}

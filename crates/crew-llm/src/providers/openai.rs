//! OpenAI provider implementation
//!
//! This module implements the `LLMProvider` trait for the OpenAI chat
//! completions API and any endpoint that speaks the same protocol.
//! See: <https://platform.openai.com/docs/api-reference/chat>
//!
//! # Examples
//!
//! ```no_run
//! use crew_llm::{CompletionRequest, LLMProvider, Message};
//! use crew_llm::providers::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create provider from OPENAI_API_KEY environment variable
//!     let provider = OpenAIProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder(provider.default_model())
//!         .add_message(Message::user("Summarize AAPL in one line"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Model used by the newsletter crew unless overridden
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: `https://api.openai.com/v1`)
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Model used when a request leaves the model empty
    pub default_model: String,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `OPENAI_API_KEY` and, when set, the base URL
    /// from `OPENAI_API_BASE`. Blank values count as unset.
    pub fn from_env() -> Result<Self> {
        let api_key = crew_utils::env::required("OPENAI_API_KEY")
            .map_err(|e| LLMError::ConfigurationError(e.to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(api_base) = crew_utils::env::var("OPENAI_API_BASE") {
            config = config.with_api_base(api_base);
        }
        Ok(config)
    }

    /// Set custom API base URL (trailing slashes are dropped)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// OpenAI chat-completions provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model
        };

        let openai_request = OpenAIRequest {
            model: model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            stop: request.stop_sequences,
        };

        debug!(
            messages = openai_request.messages.len(),
            tools = openai_request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status.as_u16(), body, model));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = openai_response.usage.unwrap_or_default();
        debug!(
            finish_reason = %choice.finish_reason.as_deref().unwrap_or("none"),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Received chat completion"
        );

        let message = parse_openai_response(choice.message);
        let stop_reason = if message.has_tool_uses() {
            StopReason::ToolUse
        } else {
            map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"))
        };

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

fn map_status_error(status: u16, body: String, model: String) -> LLMError {
    match status {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model),
        500..=599 => LLMError::ServerError { status, body },
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// The system prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(OpenAIMessage::text("system", sys));
    }
    for msg in messages {
        result.extend(convert_message(msg));
    }
    result
}

/// Convert a single message; tool results fan out into one `tool` message each
fn convert_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => return vec![OpenAIMessage::text(role, text)],
        None => return vec![OpenAIMessage::text(role, String::new())],
        Some(MessageContent::Blocks(blocks)) => blocks,
    };

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    let mut tool_messages = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => tool_messages.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let mut result = Vec::with_capacity(tool_messages.len() + 1);
    if !texts.is_empty() || !tool_calls.is_empty() {
        result.push(OpenAIMessage {
            role,
            content: (!texts.is_empty()).then(|| texts.join("\n")),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        });
    }
    result.extend(tool_messages);
    result
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

/// Arguments that are not valid JSON are passed through as a string so the
/// tool can reject them and the model can try again.
fn parse_openai_response(msg: OpenAIResponseMessage) -> Message {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let arguments = call.function.arguments;
        let input = if arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&arguments).unwrap_or_else(|e| {
                warn!(tool = %call.function.name, error = %e, "Tool arguments are not valid JSON");
                serde_json::Value::String(arguments)
            })
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    if blocks.is_empty() {
        blocks.push(ContentBlock::Text {
            text: String::new(),
        });
    }

    Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    }
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "stop" => StopReason::EndTurn,
        other => {
            debug!("Unmapped finish reason: {}", other);
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-3.5-turbo");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_config_builder_trims_base() {
        let config = OpenAIConfig::new("k")
            .with_api_base("http://localhost:8000/v1/")
            .with_timeout(30)
            .with_default_model("gpt-4o-mini");
        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn test_from_env_ignores_blank_base() {
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "sk-test");
            std::env::set_var("OPENAI_API_BASE", "  ");
        }
        let config = OpenAIConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(401, String::new(), "m".into()),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status_error(503, "down".into(), "m".into()),
            LLMError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            map_status_error(404, String::new(), "gpt-x".into()),
            LLMError::ModelNotFound(m) if m == "gpt-x"
        ));
        assert!(map_status_error(429, String::new(), "m".into()).is_retryable());
        assert!(!map_status_error(418, String::new(), "m".into()).is_retryable());
    }

    #[test]
    fn test_system_prompt_comes_first() {
        let messages = build_openai_messages(
            Some("You are an analyst".to_string()),
            vec![Message::user("AAPL")],
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_assistant_tool_call_round_trip_shape() {
        let msg = Message::tool_use("call_1", "yahoo_finance", json!({"ticker": "AAPL"}));
        let converted = convert_message(msg);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "assistant");
        assert!(converted[0].content.is_none());
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "yahoo_finance");
        assert_eq!(calls[0].function.arguments, r#"{"ticker":"AAPL"}"#);
    }

    #[test]
    fn test_multiple_tool_results_fan_out() {
        let msg = Message::tool_results(vec![
            ContentBlock::ToolResult {
                tool_use_id: "call_1".to_string(),
                content: "prices".to_string(),
                is_error: None,
            },
            ContentBlock::ToolResult {
                tool_use_id: "call_2".to_string(),
                content: "news".to_string(),
                is_error: Some(true),
            },
        ]);

        let converted = convert_message(msg);
        assert_eq!(converted.len(), 2);
        assert!(converted.iter().all(|m| m.role == "tool"));
        assert_eq!(converted[1].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn test_tool_definition_conversion() {
        let tool = ToolDefinition::new(
            "duckduckgo_news_search",
            "Search recent news",
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        );
        let converted = convert_tools(&[tool]);
        assert_eq!(converted[0].tool_type, "function");
        assert_eq!(converted[0].function.name, "duckduckgo_news_search");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw = json!({
            "content": null,
            "tool_calls": [
                {"id": "call_1", "type": "function",
                 "function": {"name": "yahoo_finance", "arguments": "{\"ticker\":\"MSFT\"}"}},
                {"id": "call_2", "type": "function",
                 "function": {"name": "duckduckgo_news_search", "arguments": ""}}
            ]
        });
        let msg: OpenAIResponseMessage = serde_json::from_value(raw).unwrap();
        let message = parse_openai_response(msg);

        let uses = message.tool_uses();
        assert_eq!(uses.len(), 2);
        match uses[1] {
            ContentBlock::ToolUse { input, .. } => assert_eq!(input, &json!({})),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_arguments_pass_through() {
        let msg = OpenAIResponseMessage {
            content: None,
            tool_calls: Some(vec![OpenAIToolCall {
                id: "call_1".to_string(),
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name: "yahoo_finance".to_string(),
                    arguments: "{ticker: AAPL".to_string(),
                },
            }]),
        };
        let message = parse_openai_response(msg);
        match message.tool_uses()[0] {
            ContentBlock::ToolUse { input, .. } => {
                assert_eq!(input, &json!("{ticker: AAPL"));
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("tool_calls"), StopReason::ToolUse);
        assert_eq!(map_stop_reason("content_filter"), StopReason::EndTurn);
    }
}

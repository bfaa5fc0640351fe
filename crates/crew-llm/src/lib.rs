//! LLM provider abstraction layer for crew agents
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! Large Language Models (LLMs). It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Tool definitions for function calling
//! - Provider trait for LLM implementations
//! - Retry policy with exponential backoff
//! - The OpenAI chat-completions provider (feature `openai`, on by default)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod retry;
pub mod tools;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use retry::RetryPolicy;
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;

//! Runtime holding the resources shared by every agent
//!
//! The AgentRuntime owns the LLM provider, model defaults, retry policy and
//! built-in prompts, and hands out [`RoleAgentBuilder`]s prefilled with them.

use crew_core::{Error, Result};
use crew_llm::{LLMProvider, RetryPolicy};
use std::sync::Arc;
use tracing::info;

use crate::agents::RoleAgentBuilder;
use crate::prompts::Prompts;

/// Defaults applied to every agent created by the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model; `None` uses the provider's default
    pub default_model: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Default iteration cap for agents
    pub default_max_iter: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            max_tokens: 2048,
            temperature: Some(0.7),
            default_max_iter: 15,
        }
    }
}

/// Runtime for creating role agents with shared dependencies
///
/// # Example
///
/// ```no_run
/// use crew_runtime::AgentRuntime;
/// use crew_llm::providers::OpenAIProvider;
/// use std::sync::Arc;
///
/// # fn example() -> crew_core::Result<()> {
/// let provider = OpenAIProvider::from_env()
///     .map_err(|e| crew_core::Error::InitializationFailed(e.to_string()))?;
/// let runtime = AgentRuntime::builder()
///     .provider(Arc::new(provider))
///     .build()?;
///
/// let analyst = runtime
///     .agent("stock_price_analyst")
///     .role("Senior stock price Analyst")
///     .goal("Find the {{ ticket }} stock price and analyse trends")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
    retry: RetryPolicy,
    prompts: Arc<Prompts>,
}

impl AgentRuntime {
    /// Create a builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get the retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Get the built-in prompts
    pub fn prompts(&self) -> &Arc<Prompts> {
        &self.prompts
    }

    /// Start building an agent with the runtime defaults applied
    pub fn agent(&self, name: impl Into<String>) -> RoleAgentBuilder {
        let mut builder = RoleAgentBuilder::new(name, self.provider.clone(), self.prompts.clone())
            .max_iter(self.config.default_max_iter)
            .max_tokens(self.config.max_tokens)
            .retry_policy(self.retry.clone());
        if let Some(model) = &self.config.default_model {
            builder = builder.model(model);
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        builder
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
    retry: RetryPolicy,
    prompts: Option<Arc<Prompts>>,
}

impl AgentRuntimeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
            retry: RetryPolicy::default(),
            prompts: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = Some(model.into());
        self
    }

    /// Set the retry policy for LLM calls
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use a custom prompt set
    pub fn prompts(mut self, prompts: Arc<Prompts>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;
        let prompts = match self.prompts {
            Some(prompts) => prompts,
            None => Arc::new(Prompts::builtin()?),
        };

        info!(
            provider = provider.name(),
            model = self.config.default_model.as_deref().unwrap_or(provider.default_model()),
            max_attempts = self.retry.max_attempts,
            "Agent runtime ready"
        );

        Ok(AgentRuntime {
            provider,
            config: self.config,
            retry: self.retry,
            prompts,
        })
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration for the newsletter crew and web UI

use crate::error::{NewsletterError, Result};
use chrono::NaiveDate;
use crew_process::Process;
use crew_utils::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Configuration for the newsletter application
///
/// The OpenAI credential is not part of it: the provider reads
/// `OPENAI_API_KEY` and `OPENAI_API_BASE` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsletterConfig {
    /// Chat model for every agent and the manager
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Tokens per completion
    pub max_tokens: usize,

    /// Sequential or hierarchical crew
    pub process: Process,

    /// Length of the price history window in days
    pub history_days: u32,

    /// Fixed end of the price window; today when unset
    pub history_end: Option<NaiveDate>,

    /// Maximum price bars handed to the LLM
    pub max_price_points: usize,

    /// Articles per news search
    pub news_results: usize,

    /// DuckDuckGo region
    pub news_region: String,

    /// LLM attempts per call, including the first
    pub max_retries: u32,

    /// Manager iteration cap
    pub crew_max_iter: usize,

    /// Crew verbosity (0, 1 or 2)
    pub verbose: u8,

    /// Web bind address
    pub bind: SocketAddr,

    /// Research runs allowed at the same time
    pub max_concurrent_runs: usize,

    /// TTL of cached price history
    pub price_cache_ttl: Duration,

    /// TTL of cached news
    pub news_cache_ttl: Duration,

    /// Timeout for market data and search requests
    pub request_timeout: Duration,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            process: Process::Hierarchical,
            history_days: 365,
            history_end: None,
            max_price_points: 60,
            news_results: 10,
            news_region: "us-en".to_string(),
            max_retries: 3,
            crew_max_iter: 15,
            verbose: 2,
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_concurrent_runs: 2,
            price_cache_ttl: Duration::from_secs(3600), // 1 hour
            news_cache_ttl: Duration::from_secs(300),   // 5 minutes
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NewsletterConfig {
    /// Create a new configuration builder
    pub fn builder() -> NewsletterConfigBuilder {
        NewsletterConfigBuilder::default()
    }

    /// Load the configuration from the environment
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let process = match env::var("NEWSLETTER_PROCESS") {
            Some(value) => value.parse::<Process>().map_err(NewsletterError::Config)?,
            None => defaults.process,
        };
        let history_end = env::var("NEWSLETTER_HISTORY_END")
            .map(|value| {
                NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
                    NewsletterError::Config(format!(
                        "NEWSLETTER_HISTORY_END '{value}' is not a YYYY-MM-DD date: {e}"
                    ))
                })
            })
            .transpose()?;

        let config = Self {
            model: env::var("NEWSLETTER_MODEL").unwrap_or(defaults.model),
            temperature: env::parse_or("NEWSLETTER_TEMPERATURE", defaults.temperature)?,
            max_tokens: env::parse_or("NEWSLETTER_MAX_TOKENS", defaults.max_tokens)?,
            process,
            history_days: env::parse_or("NEWSLETTER_HISTORY_DAYS", defaults.history_days)?,
            history_end,
            max_price_points: env::parse_or("NEWSLETTER_PRICE_POINTS", defaults.max_price_points)?,
            news_results: env::parse_or("NEWSLETTER_NEWS_RESULTS", defaults.news_results)?,
            news_region: env::var("NEWSLETTER_NEWS_REGION").unwrap_or(defaults.news_region),
            max_retries: env::parse_or("NEWSLETTER_MAX_RETRIES", defaults.max_retries)?,
            crew_max_iter: env::parse_or("NEWSLETTER_MAX_ITER", defaults.crew_max_iter)?,
            verbose: env::parse_or("NEWSLETTER_VERBOSE", defaults.verbose)?,
            bind: env::parse_or("NEWSLETTER_BIND", defaults.bind)?,
            max_concurrent_runs: env::parse_or(
                "NEWSLETTER_MAX_CONCURRENT_RUNS",
                defaults.max_concurrent_runs,
            )?,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(NewsletterError::Config(message.to_string()));

        if self.model.trim().is_empty() {
            return invalid("model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature must be between 0 and 2");
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens must be greater than 0");
        }
        if self.history_days == 0 {
            return invalid("history_days must be greater than 0");
        }
        if self.max_price_points == 0 {
            return invalid("max_price_points must be greater than 0");
        }
        if self.news_results == 0 {
            return invalid("news_results must be greater than 0");
        }
        if self.max_retries == 0 {
            return invalid("max_retries must be greater than 0");
        }
        if self.crew_max_iter == 0 {
            return invalid("crew_max_iter must be greater than 0");
        }
        if self.max_concurrent_runs == 0 {
            return invalid("max_concurrent_runs must be greater than 0");
        }

        Ok(())
    }
}

/// Builder for NewsletterConfig
#[derive(Debug, Default)]
pub struct NewsletterConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    process: Option<Process>,
    history_days: Option<u32>,
    history_end: Option<NaiveDate>,
    max_price_points: Option<usize>,
    news_results: Option<usize>,
    news_region: Option<String>,
    max_retries: Option<u32>,
    crew_max_iter: Option<usize>,
    verbose: Option<u8>,
    bind: Option<SocketAddr>,
    max_concurrent_runs: Option<usize>,
}

impl NewsletterConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Fix the end of the price window
    pub fn history_end(mut self, end: NaiveDate) -> Self {
        self.history_end = Some(end);
        self
    }

    pub fn max_price_points(mut self, points: usize) -> Self {
        self.max_price_points = Some(points);
        self
    }

    pub fn news_results(mut self, results: usize) -> Self {
        self.news_results = Some(results);
        self
    }

    pub fn news_region(mut self, region: impl Into<String>) -> Self {
        self.news_region = Some(region.into());
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn crew_max_iter(mut self, max_iter: usize) -> Self {
        self.crew_max_iter = Some(max_iter);
        self
    }

    pub fn verbose(mut self, verbose: u8) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = Some(bind);
        self
    }

    pub fn max_concurrent_runs(mut self, runs: usize) -> Self {
        self.max_concurrent_runs = Some(runs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<NewsletterConfig> {
        let defaults = NewsletterConfig::default();

        let config = NewsletterConfig {
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            process: self.process.unwrap_or(defaults.process),
            history_days: self.history_days.unwrap_or(defaults.history_days),
            history_end: self.history_end.or(defaults.history_end),
            max_price_points: self.max_price_points.unwrap_or(defaults.max_price_points),
            news_results: self.news_results.unwrap_or(defaults.news_results),
            news_region: self.news_region.unwrap_or(defaults.news_region),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            crew_max_iter: self.crew_max_iter.unwrap_or(defaults.crew_max_iter),
            verbose: self.verbose.unwrap_or(defaults.verbose),
            bind: self.bind.unwrap_or(defaults.bind),
            max_concurrent_runs: self.max_concurrent_runs.unwrap_or(defaults.max_concurrent_runs),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

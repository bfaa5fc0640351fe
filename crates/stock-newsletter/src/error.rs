//! Error types for the newsletter application

use crew_utils::ConfigError;
use thiserror::Error;

/// Newsletter specific errors
#[derive(Debug, Error)]
pub enum NewsletterError {
    /// The ticker field was empty or whitespace
    #[error("Please fill the ticket field")]
    EmptyTicker,

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// DuckDuckGo search error
    #[error("News search error: {0}")]
    Search(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page template failed to load or render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Web server could not bind or serve
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    /// LLM provider could not be set up
    #[error("LLM provider error: {0}")]
    Provider(#[from] crew_llm::LLMError),

    /// The crew failed
    #[error(transparent)]
    Crew(#[from] crew_core::Error),
}

/// Result type alias for newsletter operations
pub type Result<T> = std::result::Result<T, NewsletterError>;

impl From<ConfigError> for NewsletterError {
    fn from(err: ConfigError) -> Self {
        NewsletterError::Config(err.to_string())
    }
}

/// Tool failures surface to the agent as processing errors
impl From<NewsletterError> for crew_core::Error {
    fn from(err: NewsletterError) -> Self {
        match err {
            NewsletterError::Crew(inner) => inner,
            other => crew_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

//! Market data and news clients

pub mod duckduckgo;
pub mod yahoo;

pub use duckduckgo::{DuckDuckGoClient, NewsArticle};
pub use yahoo::{PriceBar, YahooFinanceClient};

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily price history
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily bars from `start` (inclusive) to `end` (exclusive), oldest first
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>>;
}

/// Source of news articles
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// At most `max_results` articles about `query`
    async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>>;
}

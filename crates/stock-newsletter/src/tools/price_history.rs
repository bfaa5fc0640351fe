//! Tool for fetching a stock's recent price history

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use crew_core::Result as CrewResult;
use crew_llm::tools::schema;
use crew_tools::{Tool, string_arg};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::analysis::{downsample, summarize};
use crate::api::PriceSource;
use crate::cache::{CacheKey, TtlCache};
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};

pub const NAME: &str = "yahoo_finance";

/// Daily price history over a trailing window, summarized for the LLM
pub struct PriceHistoryTool {
    source: Arc<dyn PriceSource>,
    cache: TtlCache,
    history_days: u32,
    history_end: Option<NaiveDate>,
    max_points: usize,
    description: String,
}

impl PriceHistoryTool {
    pub fn new(source: Arc<dyn PriceSource>, cache: TtlCache, config: &NewsletterConfig) -> Self {
        let until = config
            .history_end
            .map_or_else(|| "today".to_string(), |end| end.to_string());
        let description = format!(
            "Fetch the daily price history of a stock or crypto ticker (e.g. 'AAPL', 'BTC-USD') \
             for the {} days up to {until}. Returns a summary with change, high, low, moving averages \
             and trend, plus a sample of the daily bars.",
            config.history_days
        );

        Self {
            source,
            cache,
            history_days: config.history_days,
            history_end: config.history_end,
            max_points: config.max_price_points,
            description,
        }
    }

    /// First and last day of the window, both inclusive
    fn window(&self) -> Result<(NaiveDate, NaiveDate)> {
        let last = self.history_end.unwrap_or_else(|| Utc::now().date_naive());
        let first = last
            .checked_sub_days(Days::new(u64::from(self.history_days)))
            .ok_or_else(|| NewsletterError::Config(format!("history window of {} days", self.history_days)))?;
        Ok((first, last))
    }

    async fn fetch(&self, ticker: String) -> Result<Value> {
        let (first, last) = self.window()?;
        let end = last
            .checked_add_days(Days::new(1))
            .ok_or_else(|| NewsletterError::Config(format!("history end {last} out of range")))?;

        let key = CacheKey::new(
            &ticker,
            "history",
            &json!({ "start": first.to_string(), "end": last.to_string(), "points": self.max_points }),
        );

        self.cache
            .get_or_fetch(key, || async {
                let bars = self.source.history(&ticker, first, end).await?;
                let summary = summarize(&ticker, &bars)?;
                let sampled = downsample(&bars, self.max_points);
                debug!(%ticker, total = bars.len(), sampled = sampled.len(), "Fetched price history");

                Ok::<_, NewsletterError>(json!({
                    "ticker": ticker,
                    "start": first.to_string(),
                    "end": last.to_string(),
                    "summary": summary,
                    "bars": sampled,
                    "total_bars": bars.len(),
                }))
            })
            .await
    }
}

#[async_trait]
impl Tool for PriceHistoryTool {
    async fn execute(&self, params: Value) -> CrewResult<Value> {
        let ticker = string_arg(&params, &["ticker", "ticket", "symbol"])
            .ok_or_else(|| NewsletterError::InvalidSymbol("a ticker is required".to_string()))?
            .to_uppercase();

        Ok(self.fetch(ticker).await?)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({ "ticker": schema::string("Ticker symbol, e.g. 'AAPL'") }),
            vec!["ticker"],
        )
    }
}

//! Yahoo Finance API client

use crate::api::PriceSource;
use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// One daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient;

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self
    }

    /// Daily bars from `start` (inclusive) to `end` (exclusive)
    #[instrument(skip(self))]
    pub async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        if start >= end {
            return Err(NewsletterError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("empty date range {start}..{end}"),
            });
        }

        let provider =
            yahoo::YahooConnector::new().map_err(|e| NewsletterError::YahooFinance(e.to_string()))?;

        let response = provider
            .get_quote_history(symbol, to_offset(start)?, to_offset(end)?)
            .await
            .map_err(|e| NewsletterError::YahooFinance(e.to_string()))?;

        let quotes = response.quotes().map_err(|e| NewsletterError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let timestamp = i64::try_from(q.timestamp).ok()?;
                Some(PriceBar {
                    date: DateTime::from_timestamp(timestamp, 0)?.date_naive(),
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    adj_close: q.adjclose,
                    volume: q.volume,
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(NewsletterError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no price history between {start} and {end}"),
            });
        }

        debug!(bars = bars.len(), "Fetched price history");
        Ok(bars)
    }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| NewsletterError::YahooFinance(format!("Invalid date {date}: {e}")))
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        YahooFinanceClient::history(self, symbol, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_offset_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 8).unwrap();
        let offset = to_offset(date).unwrap();
        assert_eq!(offset.unix_timestamp(), 1_723_075_200);
    }

    #[tokio::test]
    async fn test_rejects_empty_range() {
        let client = YahooFinanceClient::new();
        let day = NaiveDate::from_ymd_opt(2024, 8, 8).unwrap();
        assert!(client.history("AAPL", day, day).await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_history() {
        let client = YahooFinanceClient::new();
        let bars = client
            .history(
                "AAPL",
                NaiveDate::from_ymd_opt(2023, 8, 8).unwrap(),
                NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            )
            .await
            .unwrap();

        assert!(bars.len() > 200);
        assert!(bars.windows(2).all(|w| w[0].date <= w[1].date));
    }
}

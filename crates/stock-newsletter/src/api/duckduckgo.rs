//! DuckDuckGo news search client
//!
//! Searching takes two requests: the search page yields a `vqd` token that
//! the `news.js` endpoint requires.

use crate::api::NewsSource;
use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub const DEFAULT_BASE_URL: &str = "https://duckduckgo.com/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static VQD_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"vqd=["']?([0-9][0-9-]*)["']?"#).ok());
static TAG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

/// One news search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub snippet: String,
    pub source: String,
    /// RFC 3339 publication time, empty when unknown
    pub date: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    date: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

/// DuckDuckGo client for news search
pub struct DuckDuckGoClient {
    client: Client,
    base_url: Url,
    region: String,
    rate_limiter: SharedRateLimiter,
}

impl DuckDuckGoClient {
    /// Create a client for `region` (e.g. `us-en`)
    ///
    /// Requests are limited to `requests_per_minute`.
    pub fn new(region: impl Into<String>, requests_per_minute: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| NewsletterError::Config(format!("invalid search URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            region: region.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Search news for `query`, returning at most `max_results` articles
    #[instrument(skip(self))]
    pub async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsletterError::Search("query must not be empty".to_string()));
        }

        let vqd = self.vqd_token(query).await?;

        self.rate_limiter.until_ready().await;
        let url = self.news_url(query, &vqd)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(NewsletterError::Search(format!("news endpoint returned {status}")));
        }

        let body = response.text().await?;
        let articles = parse_news(&body, max_results)?;
        debug!(articles = articles.len(), "News search finished");
        Ok(articles)
    }

    async fn vqd_token(&self, query: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("q", query);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(NewsletterError::Search(format!("search page returned {status}")));
        }

        let html = response.text().await?;
        extract_vqd(&html)
            .ok_or_else(|| NewsletterError::Search(format!("no search token for '{query}'")))
    }

    fn news_url(&self, query: &str, vqd: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("news.js")
            .map_err(|e| NewsletterError::Config(format!("invalid search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("l", &self.region)
            .append_pair("o", "json")
            .append_pair("noamp", "1")
            .append_pair("q", query)
            .append_pair("vqd", vqd)
            .append_pair("p", "-1");
        Ok(url)
    }
}

/// Pull the `vqd` token out of the search page
pub fn extract_vqd(html: &str) -> Option<String> {
    VQD_PATTERN
        .as_ref()?
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

/// Parse a `news.js` body into articles
pub fn parse_news(body: &str, max_results: usize) -> Result<Vec<NewsArticle>> {
    let response: NewsResponse = serde_json::from_str(body)?;

    Ok(response
        .results
        .into_iter()
        .filter(|raw| !raw.title.trim().is_empty())
        .take(max_results)
        .map(|raw| NewsArticle {
            title: strip_tags(&raw.title),
            snippet: strip_tags(&raw.excerpt),
            source: raw.source,
            date: raw
                .date
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            link: raw.url,
        })
        .collect())
}

fn strip_tags(text: &str) -> String {
    let stripped = match TAG_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };
    stripped
        .replace("&amp;", "&")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

#[async_trait]
impl NewsSource for DuckDuckGoClient {
    async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>> {
        DuckDuckGoClient::news(self, query, max_results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_vqd() {
        let html = r#"<script>DDG.deep.initialize('/d.js?q=AAPL&vqd=4-123456789012345678901234567890&kl=wt-wt');</script>"#;
        assert_eq!(
            extract_vqd(html).as_deref(),
            Some("4-123456789012345678901234567890")
        );
        assert_eq!(extract_vqd(r#"vqd="4-987""#).as_deref(), Some("4-987"));
        assert_eq!(extract_vqd("<html>nothing here</html>"), None);
    }

    #[test]
    fn test_parse_news() {
        let body = r#"{
            "results": [
                {"date": 1723075200, "title": "Apple <b>rallies</b>", "excerpt": "Shares &amp; options up", "url": "https://example.com/a", "source": "Reuters"},
                {"title": "", "excerpt": "no title"},
                {"date": 1723078800, "title": "Bitcoin steady", "excerpt": "BTC flat", "url": "https://example.com/b", "source": "CoinDesk"},
                {"title": "Third", "excerpt": "", "url": "https://example.com/c", "source": "AP"}
            ]
        }"#;

        let articles = parse_news(body, 2).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple rallies");
        assert_eq!(articles[0].snippet, "Shares & options up");
        assert_eq!(articles[0].date, "2024-08-08T00:00:00+00:00");
        assert_eq!(articles[1].source, "CoinDesk");

        let all = parse_news(body, 10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].date, "");
    }

    #[test]
    fn test_parse_news_rejects_garbage() {
        assert!(parse_news("<html>", 5).is_err());
        assert!(parse_news("{}", 5).unwrap().is_empty());
    }

    #[test]
    fn test_news_url() {
        let client = DuckDuckGoClient::new("us-en", 30, Duration::from_secs(5)).unwrap();
        let url = client.news_url("AAPL stock", "4-1").unwrap();
        assert!(url.as_str().starts_with("https://duckduckgo.com/news.js?l=us-en&o=json"));
        assert!(url.as_str().contains("q=AAPL+stock"));
        assert!(url.as_str().contains("vqd=4-1"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_news_search() {
        let client = DuckDuckGoClient::new("us-en", 30, Duration::from_secs(10)).unwrap();
        let articles = client.news("AAPL", 5).await.unwrap();
        assert!(articles.len() <= 5);
    }
}

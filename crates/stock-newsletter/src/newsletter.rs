//! The newsletter crew: price analyst, news analyst and writer

use chrono::Local;
use crew_llm::providers::OpenAIProvider;
use crew_llm::{LLMProvider, RetryPolicy};
use crew_process::{Crew, CrewOutput};
use crew_runtime::{AgentRuntime, RuntimeConfig};
use crew_tools::Tool;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::agents::newsletter_agents;
use crate::api::{DuckDuckGoClient, NewsSource, PriceSource, YahooFinanceClient};
use crate::cache::DataCaches;
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use crate::tasks::newsletter_tasks;
use crate::tools::{NewsSearchTool, PriceHistoryTool};

/// Searches allowed per minute against DuckDuckGo
const NEWS_REQUESTS_PER_MINUTE: u32 = 20;

/// A ready-to-run newsletter crew
///
/// One instance serves any number of concurrent [`research`](Self::research)
/// calls; each kickoff owns its memory.
pub struct NewsletterCrew {
    crew: Crew,
    caches: DataCaches,
    config: NewsletterConfig,
}

impl NewsletterCrew {
    /// Wire the crew from its parts
    ///
    /// The provider backs every agent and the manager.
    pub fn new(
        config: NewsletterConfig,
        provider: Arc<dyn LLMProvider>,
        prices: Arc<dyn PriceSource>,
        news: Arc<dyn NewsSource>,
    ) -> Result<Self> {
        config.validate()?;

        let retry = RetryPolicy::with_max_attempts(config.max_retries);
        let runtime = AgentRuntime::builder()
            .provider(provider.clone())
            .config(RuntimeConfig {
                default_model: Some(config.model.clone()),
                max_tokens: config.max_tokens,
                temperature: Some(config.temperature),
                ..RuntimeConfig::default()
            })
            .retry_policy(retry)
            .build()?;

        let caches = DataCaches::new(config.price_cache_ttl, config.news_cache_ttl);
        let price_tool: Arc<dyn Tool> =
            Arc::new(PriceHistoryTool::new(prices, caches.prices.clone(), &config));
        let news_tool: Arc<dyn Tool> = Arc::new(NewsSearchTool::new(
            news,
            caches.news.clone(),
            config.news_results,
        ));

        let mut builder = Crew::builder()
            .name("stock_newsletter")
            .process(config.process)
            .manager_llm(provider)
            .manager_model(config.model.clone())
            .manager_temperature(config.temperature)
            .manager_max_tokens(config.max_tokens)
            .max_iter(config.crew_max_iter)
            .verbosity(config.verbose)
            .full_output(true);
        for agent in newsletter_agents(&runtime, price_tool, news_tool)? {
            builder = builder.agent(agent);
        }
        for task in newsletter_tasks() {
            builder = builder.task(task);
        }
        let crew = builder.build()?;

        info!(process = %config.process, model = %config.model, "Newsletter crew ready");
        Ok(Self {
            crew,
            caches,
            config,
        })
    }

    /// OpenAI from the environment plus the live Yahoo Finance and DuckDuckGo clients
    pub fn from_config(config: NewsletterConfig) -> Result<Self> {
        let provider = Arc::new(OpenAIProvider::from_env()?);
        let news = DuckDuckGoClient::new(
            config.news_region.clone(),
            NEWS_REQUESTS_PER_MINUTE,
            config.request_timeout,
        )?;

        Self::new(
            config,
            provider,
            Arc::new(YahooFinanceClient::new()),
            Arc::new(news),
        )
    }

    pub fn config(&self) -> &NewsletterConfig {
        &self.config
    }

    pub fn crew(&self) -> &Crew {
        &self.crew
    }

    pub fn caches(&self) -> &DataCaches {
        &self.caches
    }

    /// Research `ticker` and write the newsletter
    ///
    /// A blank ticker fails with [`NewsletterError::EmptyTicker`] before any
    /// LLM call.
    #[instrument(skip(self))]
    pub async fn research(&self, ticker: &str) -> Result<CrewOutput> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(NewsletterError::EmptyTicker);
        }

        let current_date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let output = self
            .crew
            .kickoff(&json!({ "ticket": ticker, "current_date": current_date }))
            .await?;

        info!(
            run_id = %output.run_id,
            tasks = output.tasks_output.len(),
            tokens = output.token_usage.input_tokens + output.token_usage.output_tokens,
            "Research finished"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for NewsletterCrew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterCrew")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{NewsArticle, PriceBar};
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use crew_llm::CompletionResponse;
    use crew_llm::mock::ScriptedProvider;
    use crew_process::Process;
    use crew_runtime::agents::DELEGATE_WORK;

    pub(crate) struct FakePrices;

    #[async_trait]
    impl PriceSource for FakePrices {
        async fn history(&self, _symbol: &str, start: NaiveDate, _end: NaiveDate) -> Result<Vec<PriceBar>> {
            Ok((0..30u32)
                .map(|i| PriceBar {
                    date: start.checked_add_days(Days::new(u64::from(i))).unwrap(),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0,
                    adj_close: 100.0,
                    volume: 1,
                })
                .collect())
        }
    }

    pub(crate) struct FakeNews;

    #[async_trait]
    impl NewsSource for FakeNews {
        async fn news(&self, query: &str, _max_results: usize) -> Result<Vec<NewsArticle>> {
            Ok(vec![NewsArticle {
                title: format!("{query} in the news"),
                snippet: String::new(),
                source: "Reuters".to_string(),
                date: String::new(),
                link: String::new(),
            }])
        }
    }

    pub(crate) fn test_config(process: Process) -> NewsletterConfig {
        NewsletterConfig {
            process,
            history_end: NaiveDate::from_ymd_opt(2024, 8, 8),
            max_retries: 1,
            verbose: 0,
            ..NewsletterConfig::default()
        }
    }

    pub(crate) fn test_crew(process: Process, provider: Arc<ScriptedProvider>) -> NewsletterCrew {
        NewsletterCrew::new(
            test_config(process),
            provider,
            Arc::new(FakePrices),
            Arc::new(FakeNews),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_ticker_never_reaches_the_llm() {
        let provider = Arc::new(ScriptedProvider::new().with_fallback("unused"));
        let newsletter = test_crew(Process::Hierarchical, provider.clone());

        let err = newsletter.research("   ").await.unwrap_err();
        assert!(matches!(err, NewsletterError::EmptyTicker));
        assert_eq!(err.to_string(), "Please fill the ticket field");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_research() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call("call_1", "yahoo_finance", json!({"ticket": "aapl"})),
            CompletionResponse::text("stock='AAPL, price SIDEWAYS'"),
            CompletionResponse::tool_call("call_2", "duckduckgo_news_search", json!({"query": "AAPL"})),
            CompletionResponse::text("AAPL 55, BTC 70"),
            CompletionResponse::text("# AAPL newsletter"),
        ]));
        let newsletter = test_crew(Process::Sequential, provider.clone());

        let output = newsletter.research(" AAPL ").await.unwrap();
        assert_eq!(output.final_output, "# AAPL newsletter");
        assert_eq!(output.tasks_output.len(), 3);
        assert_eq!(output.tasks_output[0].raw, "stock='AAPL, price SIDEWAYS'");

        let requests = provider.requests();
        assert_eq!(requests.len(), 5);
        // The tool result carries the price summary back to the analyst.
        let tool_result = requests[1].messages.last().unwrap();
        assert!(format!("{tool_result:?}").contains("SIDEWAYS"));
        assert_eq!(newsletter.caches().prices.len().await, 1);
        assert!(requests[4].messages[0].text().unwrap().contains("about the AAPL company"));
    }

    #[tokio::test]
    async fn test_manager_uses_configured_sampling() {
        let provider = Arc::new(ScriptedProvider::new().with_fallback("done"));
        let config = NewsletterConfig {
            temperature: 0.1,
            max_tokens: 300,
            ..test_config(Process::Hierarchical)
        };
        let newsletter =
            NewsletterCrew::new(config, provider.clone(), Arc::new(FakePrices), Arc::new(FakeNews))
                .unwrap();

        newsletter.research("AAPL").await.unwrap();

        let request = &provider.requests()[0];
        assert!(request.system.as_deref().unwrap().starts_with("You are Crew Manager."));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, 300);
    }

    #[tokio::test]
    async fn test_hierarchical_manager_delegates() {
        let provider = Arc::new(
            ScriptedProvider::with_responses([
                CompletionResponse::tool_call(
                    "call_1",
                    DELEGATE_WORK,
                    json!({
                        "task": "Analyze the AAPL price trend",
                        "context": "Yearly history",
                        "coworker": "Senior stock price Analyst"
                    }),
                ),
                CompletionResponse::text("stock='AAPL, price UP'"),
                CompletionResponse::text("Trend: stock='AAPL, price UP'"),
            ])
            .with_fallback("manager answer"),
        );
        let newsletter = test_crew(Process::Hierarchical, provider.clone());

        let output = newsletter.research("AAPL").await.unwrap();
        assert_eq!(output.tasks_output.len(), 3);
        assert_eq!(output.tasks_output[0].raw, "Trend: stock='AAPL, price UP'");
        assert_eq!(output.final_output, "manager answer");

        let requests = provider.requests();
        let delegated = requests[1].system.as_deref().unwrap();
        assert!(delegated.contains("Senior stock price Analyst"));
    }
}

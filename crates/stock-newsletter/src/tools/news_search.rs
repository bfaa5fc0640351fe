//! Tool for searching recent news

use async_trait::async_trait;
use crew_core::Result as CrewResult;
use crew_llm::tools::schema;
use crew_tools::{Tool, string_arg};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::NewsSource;
use crate::cache::{CacheKey, TtlCache};
use crate::error::{NewsletterError, Result};

pub const NAME: &str = "duckduckgo_news_search";

/// Upper bound on articles per search
pub const MAX_RESULTS_CAP: usize = 25;

/// News search over DuckDuckGo
pub struct NewsSearchTool {
    source: Arc<dyn NewsSource>,
    cache: TtlCache,
    default_results: usize,
}

impl NewsSearchTool {
    pub fn new(source: Arc<dyn NewsSource>, cache: TtlCache, default_results: usize) -> Self {
        Self {
            source,
            cache,
            default_results,
        }
    }

    async fn search(&self, query: String, max_results: usize) -> Result<Value> {
        let key = CacheKey::new(&query, "news", &json!({ "max_results": max_results }));

        self.cache
            .get_or_fetch(key, || async {
                let articles = self.source.news(&query, max_results).await?;
                Ok::<_, NewsletterError>(json!({ "query": query, "articles": articles }))
            })
            .await
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> CrewResult<Value> {
        let query = string_arg(&params, &["query", "search_query", "q"])
            .ok_or_else(|| NewsletterError::Search("a query is required".to_string()))?;
        let max_results = params
            .get("max_results")
            .and_then(Value::as_u64)
            .map_or(self.default_results, |n| usize::try_from(n).unwrap_or(MAX_RESULTS_CAP))
            .clamp(1, MAX_RESULTS_CAP);

        Ok(self.search(query, max_results).await?)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search recent news articles. Returns title, snippet, source, date and link for each hit."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "query": schema::string("What to search for, e.g. 'AAPL stock news'"),
                "max_results": schema::integer("Number of articles to return"),
            }),
            vec!["query"],
        )
    }
}

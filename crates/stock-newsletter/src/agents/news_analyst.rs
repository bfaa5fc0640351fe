//! Market news analyst

use crew_core::Result;
use crew_runtime::{AgentRuntime, RoleAgent};
use crew_tools::Tool;
use std::sync::Arc;

pub const NAME: &str = "stock_news_analyst";
pub const ROLE: &str = "Stock news Analyst";
pub const GOAL: &str = "Create a short summary of the market news related to the stock {{ ticket }} company. \
Specify the current trend - up, down or sideways with the news context. \
For each requested stock specify a number between 0 and 100, where 0 is extreme fear and 100 is extreme greed.";
pub const BACKSTORY: &str = "You're a higly experienced in analyzing the market trends and news \
and have tracked assets for more than 10 years.
You're also a master level analyst in the traditional markets and have a deep understanding of human psychology.
You understand news, their titles and information, but you look at those with a healthy dose of skepticism.
You consider also the source of the news articles.";

/// Searches the news and scores fear and greed
pub fn build(runtime: &AgentRuntime, news_tool: Arc<dyn Tool>) -> Result<RoleAgent> {
    runtime
        .agent(NAME)
        .role(ROLE)
        .goal(GOAL)
        .backstory(BACKSTORY)
        .tool(news_tool)
        .max_iter(10)
        .memory(true)
        .allow_delegation(false)
        .verbose(true)
        .build()
}

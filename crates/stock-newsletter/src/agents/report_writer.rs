//! Newsletter writer

use crew_core::Result;
use crew_runtime::{AgentRuntime, RoleAgent};

pub const NAME: &str = "stock_analyst_writer";
pub const ROLE: &str = "Senior Stock Analyst Writer";
pub const GOAL: &str = "Analyze the trends price and news and write an insightfull compelling and informative \
3 paragraph long newsletter based on the stock report and price trend.";
pub const BACKSTORY: &str = "You're widely accepted as the best stock analyst in the market.
You understand complex concepts and create compelling stories and narratives that resonate with wider audiences.
You understand macro factors and combine multiple theories - eg. cycle theory and fundamental analysis.
You're able to hold multiple opinions when analyzing anything.";

/// Has no tools of its own; may delegate to the analysts
pub fn build(runtime: &AgentRuntime) -> Result<RoleAgent> {
    runtime
        .agent(NAME)
        .role(ROLE)
        .goal(GOAL)
        .backstory(BACKSTORY)
        .max_iter(5)
        .memory(true)
        .allow_delegation(true)
        .verbose(true)
        .build()
}

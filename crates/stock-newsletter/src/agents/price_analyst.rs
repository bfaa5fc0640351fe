//! Price trend analyst

use crew_core::Result;
use crew_runtime::{AgentRuntime, RoleAgent};
use crew_tools::Tool;
use std::sync::Arc;

pub const NAME: &str = "stock_price_analyst";
pub const ROLE: &str = "Senior stock price Analyst";
pub const GOAL: &str = "Find the {{ ticket }} stock price and analyses trends";
pub const BACKSTORY: &str = "You're a higly experienced in analyzing the price of an specific stock \
and make predictions about its future price.";

/// Reads the price history and calls the trend
pub fn build(runtime: &AgentRuntime, price_tool: Arc<dyn Tool>) -> Result<RoleAgent> {
    runtime
        .agent(NAME)
        .role(ROLE)
        .goal(GOAL)
        .backstory(BACKSTORY)
        .tool(price_tool)
        .max_iter(5)
        .memory(true)
        .allow_delegation(false)
        .verbose(true)
        .build()
}

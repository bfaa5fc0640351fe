//! The three newsletter agents

pub mod news_analyst;
pub mod price_analyst;
pub mod report_writer;

use crew_core::Result;
use crew_runtime::{AgentRuntime, RoleAgent};
use crew_tools::Tool;
use std::sync::Arc;

/// Build the analysts and the writer, in crew order
pub fn newsletter_agents(
    runtime: &AgentRuntime,
    price_tool: Arc<dyn Tool>,
    news_tool: Arc<dyn Tool>,
) -> Result<Vec<RoleAgent>> {
    Ok(vec![
        price_analyst::build(runtime, price_tool)?,
        news_analyst::build(runtime, news_tool)?,
        report_writer::build(runtime)?,
    ])
}

//! Results of a crew run

use crew_llm::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task name
    pub name: String,
    /// Interpolated task description
    pub description: String,
    /// Role of the agent that produced the output
    pub agent: String,
    /// Final answer text
    pub raw: String,
}

/// Output of a kickoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Identifier of the run
    pub run_id: String,
    /// Raw output of the last task
    pub final_output: String,
    /// Every task output in execution order; empty unless full output is on
    pub tasks_output: Vec<TaskOutput>,
    /// Tokens used by every agent of the run
    pub token_usage: TokenUsage,
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.final_output)
    }
}

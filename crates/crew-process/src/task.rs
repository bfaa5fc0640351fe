//! Task definitions

use crew_core::Result;
use crew_prompt::interpolate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of work for the crew
///
/// `description` and `expected_output` may reference kickoff inputs
/// (`{{ ticket }}`). `context` names earlier tasks whose outputs this task
/// builds on; when empty, every previous output is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name
    pub name: String,
    /// What to do
    pub description: String,
    /// What the final answer must look like
    pub expected_output: String,
    /// Name of the agent that executes the task
    pub agent: Option<String>,
    /// Names of earlier tasks feeding this one
    pub context: Vec<String>,
}

impl Task {
    /// Create a task with no agent and no explicit context
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            context: Vec::new(),
        }
    }

    /// Assign the agent
    #[must_use]
    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the tasks whose outputs feed this one
    #[must_use]
    pub fn context<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = tasks.into_iter().map(Into::into).collect();
        self
    }

    /// Copy with kickoff inputs rendered into description and expected output
    pub fn interpolate(&self, inputs: &Value) -> Result<Self> {
        Ok(Self {
            description: interpolate(&self.description, inputs)?,
            expected_output: interpolate(&self.expected_output, inputs)?,
            ..self.clone()
        })
    }
}

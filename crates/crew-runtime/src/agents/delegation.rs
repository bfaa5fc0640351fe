//! Tools that let an agent hand work to its coworkers

use crate::agents::role::{ExecutionScope, RoleAgent, TaskPrompt};
use async_trait::async_trait;
use crew_core::{Error, Result};
use crew_llm::tools::schema;
use crew_tools::{Tool, string_arg};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Tool name for delegating a task
pub const DELEGATE_WORK: &str = "delegate_work_to_coworker";
/// Tool name for asking a question
pub const ASK_QUESTION: &str = "ask_question_to_coworker";

const COWORKER_EXPECTED_OUTPUT: &str =
    "Your best answer to your coworker asking you this, accounting for the context shared.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Delegate,
    Ask,
}

impl Mode {
    fn argument(self) -> &'static str {
        match self {
            Mode::Delegate => "task",
            Mode::Ask => "question",
        }
    }
}

/// `delegate_work_to_coworker` / `ask_question_to_coworker`
///
/// Work runs on the coworker with the delegated scope, which carries no
/// coworkers, so a delegate can never delegate further.
pub struct CoworkerTool {
    mode: Mode,
    description: String,
    coworkers: Vec<Arc<RoleAgent>>,
    scope: ExecutionScope,
}

impl CoworkerTool {
    /// Tool that delegates a task to a coworker
    pub fn delegate_work(coworkers: Vec<Arc<RoleAgent>>, scope: ExecutionScope) -> Self {
        let description = format!(
            "Delegate a specific task to one of the following coworkers: {}. \
             The input must contain the task, all necessary context since they know nothing \
             about it, and the exact role of the coworker.",
            roles(&coworkers)
        );
        Self {
            mode: Mode::Delegate,
            description,
            coworkers,
            scope,
        }
    }

    /// Tool that asks a coworker a question
    pub fn ask_question(coworkers: Vec<Arc<RoleAgent>>, scope: ExecutionScope) -> Self {
        let description = format!(
            "Ask a specific question to one of the following coworkers: {}. \
             The input must contain the question, all necessary context since they know nothing \
             about it, and the exact role of the coworker.",
            roles(&coworkers)
        );
        Self {
            mode: Mode::Ask,
            description,
            coworkers,
            scope,
        }
    }

    fn find_coworker(&self, wanted: &str) -> Result<&Arc<RoleAgent>> {
        self.coworkers
            .iter()
            .find(|coworker| coworker.answers_to(wanted))
            .ok_or_else(|| {
                Error::ProcessingFailed(format!(
                    "Coworker '{}' not found. Choose one of: {}",
                    wanted.trim(),
                    roles(&self.coworkers)
                ))
            })
    }
}

fn roles(coworkers: &[Arc<RoleAgent>]) -> String {
    coworkers
        .iter()
        .map(|c| c.role().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Tool for CoworkerTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        if !params.is_object() {
            return Err(Error::ProcessingFailed(format!(
                "Expected an object with '{}', 'context' and 'coworker'",
                self.mode.argument()
            )));
        }

        let request = string_arg(&params, &[self.mode.argument()]).ok_or_else(|| {
            Error::ProcessingFailed(format!("Missing required parameter '{}'", self.mode.argument()))
        })?;
        let wanted = string_arg(&params, &["coworker"])
            .ok_or_else(|| Error::ProcessingFailed("Missing required parameter 'coworker'".to_string()))?;
        let context = string_arg(&params, &["context"]);

        let coworker = self.find_coworker(&wanted)?;
        info!(
            coworker = %coworker.role(),
            mode = ?self.mode,
            "Handing work to coworker"
        );

        let mut task = TaskPrompt::new(request, COWORKER_EXPECTED_OUTPUT);
        task.context = context;
        let answer = coworker.execute_task(&task, &self.scope).await?;
        Ok(Value::String(answer))
    }

    fn name(&self) -> &str {
        match self.mode {
            Mode::Delegate => DELEGATE_WORK,
            Mode::Ask => ASK_QUESTION,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        let argument = self.mode.argument();
        let what = match self.mode {
            Mode::Delegate => "The task to delegate",
            Mode::Ask => "The question to ask",
        };
        schema::object(
            json!({
                argument: schema::string(what),
                "context": schema::string("Everything the coworker needs to know"),
                "coworker": schema::string("Role of the coworker"),
            }),
            vec![argument, "coworker"],
        )
    }
}

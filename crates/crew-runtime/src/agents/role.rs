//! Role agents: an LLM persona defined by role, goal and backstory

use crate::agents::delegation::CoworkerTool;
use crate::executor::{
    AgentExecutor, ExecutorConfig, ExecutorEventHandler, LoggingEventHandler, UsageMeter,
};
use crate::memory::ShortTermMemory;
use crate::prompts::Prompts;
use async_trait::async_trait;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::{LLMProvider, RetryPolicy};
use crew_prompt::interpolate;
use crew_tools::{Tool, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of memory entries rendered into a task prompt
pub const MEMORY_WINDOW: usize = 3;

/// Expected output used when a role agent runs through the plain [`Agent`] trait
pub const DEFAULT_EXPECTED_OUTPUT: &str = "Your best answer.";

/// A task as seen by the agent executing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    /// What to do
    pub description: String,
    /// What the final answer must look like
    pub expected_output: String,
    /// Outputs of earlier work this task builds on
    pub context: Option<String>,
}

impl TaskPrompt {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Run-scoped collaborators of an agent
///
/// Built by the crew for every task. Delegated work reuses the memory,
/// event handler and usage meter but gets no coworkers.
#[derive(Clone, Default)]
pub struct ExecutionScope {
    /// Memory of the current run
    pub memory: Option<ShortTermMemory>,
    /// Agents this agent may delegate to
    pub coworkers: Vec<Arc<RoleAgent>>,
    /// Receives executor events
    pub event_handler: Option<Arc<dyn ExecutorEventHandler>>,
    /// Token usage of the whole run
    pub usage: UsageMeter,
}

impl ExecutionScope {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_memory(mut self, memory: ShortTermMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    #[must_use]
    pub fn with_coworkers(mut self, coworkers: Vec<Arc<RoleAgent>>) -> Self {
        self.coworkers = coworkers;
        self
    }

    #[must_use]
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: UsageMeter) -> Self {
        self.usage = usage;
        self
    }

    /// Scope for work handed to a coworker
    fn delegated(&self) -> Self {
        Self {
            memory: self.memory.clone(),
            coworkers: Vec::new(),
            event_handler: self.event_handler.clone(),
            usage: self.usage.clone(),
        }
    }
}

impl std::fmt::Debug for ExecutionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionScope")
            .field("memory", &self.memory.as_ref().map(ShortTermMemory::len))
            .field(
                "coworkers",
                &self.coworkers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("usage", &self.usage.total())
            .finish_non_exhaustive()
    }
}

/// An agent with a role, a goal and a backstory
///
/// Each task runs a fresh [`AgentExecutor`] whose system prompt is built from
/// the persona and whose user prompt is the task.
#[derive(Clone)]
pub struct RoleAgent {
    name: String,
    role: String,
    goal: String,
    backstory: String,
    tools: Arc<ToolRegistry>,
    max_iter: usize,
    memory: bool,
    allow_delegation: bool,
    verbose: bool,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: usize,
    provider: Arc<dyn LLMProvider>,
    retry: RetryPolicy,
    prompts: Arc<Prompts>,
}

impl RoleAgent {
    /// Start building an agent
    pub fn builder(
        name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<Prompts>,
    ) -> RoleAgentBuilder {
        RoleAgentBuilder::new(name, provider, prompts)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory
    }

    pub fn allows_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Whether `name` refers to this agent, by role or by name
    pub fn answers_to(&self, name: &str) -> bool {
        let wanted = normalize(name);
        !wanted.is_empty()
            && (normalize(&self.role) == wanted || normalize(&self.name) == wanted)
    }

    /// Copy of this agent with kickoff inputs rendered into role, goal and backstory
    pub fn interpolate(&self, inputs: &Value) -> Result<Self> {
        let mut agent = self.clone();
        agent.role = interpolate(&self.role, inputs)?;
        agent.goal = interpolate(&self.goal, inputs)?;
        agent.backstory = interpolate(&self.backstory, inputs)?;
        Ok(agent)
    }

    /// Copy of this agent with verbose event logging switched on or off
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute one task and return the final answer
    pub async fn execute_task(&self, task: &TaskPrompt, scope: &ExecutionScope) -> Result<String> {
        let coworkers: Vec<Arc<RoleAgent>> = scope
            .coworkers
            .iter()
            .filter(|coworker| coworker.name != self.name)
            .cloned()
            .collect();
        let delegating = self.allow_delegation && !coworkers.is_empty();

        let tools = if delegating {
            let registry = ToolRegistry::new();
            registry.extend_from(&self.tools);
            let delegated_scope = scope.delegated();
            registry.register(Arc::new(CoworkerTool::delegate_work(
                coworkers.clone(),
                delegated_scope.clone(),
            )));
            registry.register(Arc::new(CoworkerTool::ask_question(
                coworkers.clone(),
                delegated_scope,
            )));
            Arc::new(registry)
        } else {
            self.tools.clone()
        };

        let tool_list: Vec<(String, String)> = tools
            .list_tools()
            .iter()
            .map(|tool| (tool.name().to_string(), tool.description().to_string()))
            .collect();
        let coworker_roles: Vec<String> = if delegating {
            coworkers.iter().map(|c| c.role.clone()).collect()
        } else {
            Vec::new()
        };

        let system_prompt = self.prompts.agent_system(
            &self.role,
            &self.goal,
            &self.backstory,
            &tool_list,
            &coworker_roles,
        )?;

        let memory = match (&scope.memory, self.memory) {
            (Some(memory), true) => memory.recent(MEMORY_WINDOW),
            _ => Vec::new(),
        };
        let user_prompt = self.prompts.task(
            &task.description,
            &task.expected_output,
            task.context.as_deref(),
            &memory,
        )?;

        let config = ExecutorConfig {
            max_iterations: self.max_iter,
            model: self.model.clone().unwrap_or_default(),
            system_prompt: Some(system_prompt),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            final_answer_prompt: self.prompts.final_answer()?,
        };

        let mut executor =
            AgentExecutor::new(self.provider.clone(), tools, config).with_retry_policy(self.retry.clone());
        match (&scope.event_handler, self.verbose) {
            (Some(handler), _) => executor = executor.with_event_handler(handler.clone()),
            (None, true) => {
                executor = executor.with_event_handler(Arc::new(LoggingEventHandler::new(&self.role)));
            }
            (None, false) => {}
        }

        info!(agent = %self.role, delegating, memory_entries = memory.len(), "Agent started task");
        debug!(agent = %self.role, task = %task.description, "Task prompt");

        let result = executor.run(user_prompt).await?;
        scope.usage.record(result.usage);

        info!(
            agent = %self.role,
            llm_calls = result.llm_calls,
            forced_final_answer = result.forced_final_answer,
            "Agent finished task"
        );
        Ok(result.output)
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

#[async_trait]
impl Agent for RoleAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let task = TaskPrompt::new(input, DEFAULT_EXPECTED_OUTPUT);
        let output = self.execute_task(&task, &ExecutionScope::new()).await?;
        context.insert("last_agent", Value::String(self.name.clone()));
        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for RoleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAgent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("tools", &self.tools.names())
            .field("max_iter", &self.max_iter)
            .field("memory", &self.memory)
            .field("allow_delegation", &self.allow_delegation)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RoleAgent`]
pub struct RoleAgentBuilder {
    name: String,
    role: String,
    goal: String,
    backstory: String,
    tools: ToolRegistry,
    max_iter: usize,
    memory: bool,
    allow_delegation: bool,
    verbose: bool,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: usize,
    provider: Arc<dyn LLMProvider>,
    retry: RetryPolicy,
    prompts: Arc<Prompts>,
}

impl RoleAgentBuilder {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>, prompts: Arc<Prompts>) -> Self {
        Self {
            name: name.into(),
            role: String::new(),
            goal: String::new(),
            backstory: String::new(),
            tools: ToolRegistry::new(),
            max_iter: 15,
            memory: false,
            allow_delegation: false,
            verbose: false,
            model: None,
            temperature: None,
            max_tokens: 2048,
            provider,
            retry: RetryPolicy::default(),
            prompts,
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn tool(self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<RoleAgent> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfiguration("agent name must not be empty".to_string()));
        }
        if self.role.trim().is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "agent '{}' has no role",
                self.name
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "agent '{}' needs max_iter of at least 1",
                self.name
            )));
        }

        Ok(RoleAgent {
            name: self.name,
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            tools: Arc::new(self.tools),
            max_iter: self.max_iter,
            memory: self.memory,
            allow_delegation: self.allow_delegation,
            verbose: self.verbose,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            provider: self.provider,
            retry: self.retry,
            prompts: self.prompts,
        })
    }
}

//! Crew definition and kickoff

use crate::output::{CrewOutput, TaskOutput};
use crate::process::{Process, Verbosity};
use crate::task::Task;
use async_trait::async_trait;
use crew_core::context::keys;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::{LLMProvider, RetryPolicy};
use crew_runtime::{ExecutionScope, Prompts, RoleAgent, ShortTermMemory, TaskPrompt, UsageMeter};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Name of the manager agent of hierarchical crews
pub const MANAGER_NAME: &str = "crew_manager";
/// Role of the manager agent
pub const MANAGER_ROLE: &str = "Crew Manager";

const MANAGER_GOAL: &str = "Manage the team to complete the task in the best way possible.";
const MANAGER_BACKSTORY: &str = "You are a seasoned manager with a knack for getting the best out of your team.
You are also known for your ability to delegate work to the right people, and to ask the right questions to get the best out of your team.
Even though you don't perform tasks by yourself, you have a lot of experience in the field, which allows you to properly evaluate the work of your team members.";

const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// A set of agents working through a list of tasks
///
/// A crew is immutable once built. Every kickoff interpolates fresh copies
/// of the agents and tasks and owns its memory, so concurrent kickoffs never
/// share run state.
///
/// # Example
///
/// ```no_run
/// use crew_process::{Crew, Process, Task};
/// use crew_runtime::AgentRuntime;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example(runtime: AgentRuntime) -> crew_core::Result<()> {
/// let analyst = runtime
///     .agent("stock_price_analyst")
///     .role("Senior stock price Analyst")
///     .goal("Find the {{ ticket }} stock price and analyse trends")
///     .build()?;
///
/// let crew = Crew::builder()
///     .agent(analyst)
///     .task(
///         Task::new("get_stock_price", "Analyze the stock {{ ticket }}", "The trend")
///             .agent("stock_price_analyst"),
///     )
///     .process(Process::Sequential)
///     .build()?;
///
/// let output = crew.kickoff(&json!({ "ticket": "AAPL" })).await?;
/// println!("{}", output.final_output);
/// # Ok(())
/// # }
/// ```
pub struct Crew {
    name: String,
    agents: Vec<Arc<RoleAgent>>,
    tasks: Vec<Task>,
    process: Process,
    manager: Option<Arc<RoleAgent>>,
    verbosity: Verbosity,
    full_output: bool,
}

impl Crew {
    /// Create a builder
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    pub fn process_mode(&self) -> Process {
        self.process
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn agents(&self) -> &[Arc<RoleAgent>] {
        &self.agents
    }

    /// Manager agent; present for hierarchical crews only
    pub fn manager(&self) -> Option<&Arc<RoleAgent>> {
        self.manager.as_ref()
    }

    fn uses_memory(&self) -> bool {
        self.agents.iter().any(|agent| agent.memory_enabled())
    }

    /// Run every task with the given inputs
    pub async fn kickoff(&self, inputs: &Value) -> Result<CrewOutput> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("crew_kickoff", crew = %self.name, %run_id, process = %self.process);
        self.run(run_id, inputs).instrument(span).await
    }

    async fn run(&self, run_id: String, inputs: &Value) -> Result<CrewOutput> {
        let detailed = self.verbosity >= Verbosity::Detailed;

        let mut agents = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let verbose = detailed || agent.is_verbose();
            agents.push(Arc::new(agent.interpolate(inputs)?.with_verbose(verbose)));
        }
        let tasks = self
            .tasks
            .iter()
            .map(|task| task.interpolate(inputs))
            .collect::<Result<Vec<_>>>()?;
        let manager = self
            .manager
            .as_ref()
            .map(|manager| Arc::new(RoleAgent::clone(manager).with_verbose(detailed)));

        let usage = UsageMeter::new();
        let memory = self.uses_memory().then(ShortTermMemory::new);
        let mut scope = ExecutionScope::new()
            .with_usage(usage.clone())
            .with_coworkers(agents.clone());
        if let Some(memory) = &memory {
            scope = scope.with_memory(memory.clone());
        }

        self.report(format_args!("Crew started with {} tasks", tasks.len()));

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let executor = match &manager {
                Some(manager) => manager.clone(),
                None => find_agent(&agents, task)?,
            };

            let mut prompt = TaskPrompt::new(&task.description, &task.expected_output);
            prompt.context = context_for(task, &outputs);

            self.report(format_args!("Task '{}' started by {}", task.name, executor.role()));
            let raw = executor.execute_task(&prompt, &scope).await?;
            self.report(format_args!("Task '{}' finished", task.name));
            debug!(task = %task.name, output = %raw, "Task output");

            if let Some(memory) = &memory {
                memory.add(&task.name, executor.role(), &raw);
            }
            outputs.push(TaskOutput {
                name: task.name.clone(),
                description: task.description.clone(),
                agent: executor.role().to_string(),
                raw,
            });
        }

        let final_output = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        let token_usage = usage.total();
        info!(
            input_tokens = token_usage.input_tokens,
            output_tokens = token_usage.output_tokens,
            "Crew finished"
        );

        Ok(CrewOutput {
            run_id,
            final_output,
            tasks_output: if self.full_output { outputs } else { Vec::new() },
            token_usage,
        })
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        if self.verbosity >= Verbosity::Normal {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }
}

fn find_agent(agents: &[Arc<RoleAgent>], task: &Task) -> Result<Arc<RoleAgent>> {
    let wanted = task.agent.as_deref().unwrap_or_default();
    agents
        .iter()
        .find(|agent| agent.name() == wanted)
        .cloned()
        .ok_or_else(|| {
            Error::InvalidConfiguration(format!("task '{}' has no agent '{wanted}'", task.name))
        })
}

/// Outputs of the task's context tasks, or of every earlier task when it names none
fn context_for(task: &Task, outputs: &[TaskOutput]) -> Option<String> {
    let selected: Vec<&str> = if task.context.is_empty() {
        outputs.iter().map(|o| o.raw.as_str()).collect()
    } else {
        task.context
            .iter()
            .filter_map(|name| outputs.iter().find(|o| &o.name == name))
            .map(|o| o.raw.as_str())
            .collect()
    };
    (!selected.is_empty()).then(|| selected.join(CONTEXT_SEPARATOR))
}

/// Runs the crew through the plain agent interface
///
/// Kickoff inputs come from the context; the run id and the name of the last
/// task are written back to it.
#[async_trait]
impl Agent for Crew {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let mut inputs = context.get(keys::INPUTS).cloned().unwrap_or_else(|| json!({}));
        if let Some(map) = inputs.as_object_mut() {
            map.entry("input").or_insert(Value::String(input));
        }

        let output = self.kickoff(&inputs).await?;
        context.insert(keys::RUN_ID, Value::String(output.run_id));
        if let Some(last) = self.tasks.last() {
            context.set_task_name(&last.name);
        }
        Ok(output.final_output)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("name", &self.name)
            .field("process", &self.process)
            .field("agents", &self.agents.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("tasks", &self.tasks.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("verbosity", &self.verbosity)
            .field("full_output", &self.full_output)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Crew`]
pub struct CrewBuilder {
    name: String,
    agents: Vec<RoleAgent>,
    tasks: Vec<Task>,
    process: Process,
    manager_llm: Option<Arc<dyn LLMProvider>>,
    manager_model: Option<String>,
    manager_temperature: Option<f32>,
    manager_max_tokens: Option<usize>,
    max_iter: usize,
    verbosity: Verbosity,
    full_output: bool,
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self {
            name: "crew".to_string(),
            agents: Vec::new(),
            tasks: Vec::new(),
            process: Process::Sequential,
            manager_llm: None,
            manager_model: None,
            manager_temperature: None,
            manager_max_tokens: None,
            max_iter: 15,
            verbosity: Verbosity::Quiet,
            full_output: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn agent(mut self, agent: RoleAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// LLM driving the manager of a hierarchical crew
    pub fn manager_llm(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.manager_llm = Some(provider);
        self
    }

    /// Model for the manager; the provider default when unset
    pub fn manager_model(mut self, model: impl Into<String>) -> Self {
        self.manager_model = Some(model.into());
        self
    }

    /// Sampling temperature of the manager
    pub fn manager_temperature(mut self, temperature: f32) -> Self {
        self.manager_temperature = Some(temperature);
        self
    }

    /// Tokens per manager completion
    pub fn manager_max_tokens(mut self, max_tokens: usize) -> Self {
        self.manager_max_tokens = Some(max_tokens);
        self
    }

    /// Iteration cap of the manager agent
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn verbosity(mut self, verbosity: impl Into<Verbosity>) -> Self {
        self.verbosity = verbosity.into();
        self
    }

    /// Keep every task output in the result, not just the last one
    pub fn full_output(mut self, full_output: bool) -> Self {
        self.full_output = full_output;
        self
    }

    /// Validate and build the crew
    pub fn build(self) -> Result<Crew> {
        let invalid = |message: String| Err(Error::InvalidConfiguration(message));

        if self.tasks.is_empty() {
            return invalid("a crew needs at least one task".to_string());
        }

        let mut agent_names = HashSet::new();
        for agent in &self.agents {
            if !agent_names.insert(agent.name()) {
                return invalid(format!("duplicate agent name '{}'", agent.name()));
            }
        }

        let mut seen_tasks = HashSet::new();
        for task in &self.tasks {
            for dependency in &task.context {
                if !seen_tasks.contains(dependency.as_str()) {
                    return invalid(format!(
                        "task '{}' uses '{dependency}' as context, which is not an earlier task",
                        task.name
                    ));
                }
            }
            if !seen_tasks.insert(task.name.as_str()) {
                return invalid(format!("duplicate task name '{}'", task.name));
            }

            match (&task.agent, self.process) {
                (Some(agent), _) if !agent_names.contains(agent.as_str()) => {
                    return invalid(format!("task '{}' names unknown agent '{agent}'", task.name));
                }
                (None, Process::Sequential) => {
                    return invalid(format!(
                        "task '{}' has no agent; sequential crews need one per task",
                        task.name
                    ));
                }
                _ => {}
            }
        }

        let manager = match self.process {
            Process::Sequential => None,
            Process::Hierarchical => Some(Arc::new(self.build_manager()?)),
        };

        Ok(Crew {
            name: self.name,
            agents: self.agents.into_iter().map(Arc::new).collect(),
            tasks: self.tasks,
            process: self.process,
            manager,
            verbosity: self.verbosity,
            full_output: self.full_output,
        })
    }

    fn build_manager(&self) -> Result<RoleAgent> {
        let provider = self.manager_llm.clone().ok_or_else(|| {
            Error::InvalidConfiguration("a hierarchical crew needs a manager LLM".to_string())
        })?;
        if self.agents.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a hierarchical crew needs agents to delegate to".to_string(),
            ));
        }

        let retry = self
            .agents
            .first()
            .map_or_else(RetryPolicy::default, |agent| agent.retry_policy().clone());
        let mut builder = RoleAgent::builder(MANAGER_NAME, provider, Arc::new(Prompts::builtin()?))
            .role(MANAGER_ROLE)
            .goal(MANAGER_GOAL)
            .backstory(MANAGER_BACKSTORY)
            .allow_delegation(true)
            .memory(self.agents.iter().any(RoleAgent::memory_enabled))
            .max_iter(self.max_iter)
            .retry_policy(retry);
        if let Some(model) = &self.manager_model {
            builder = builder.model(model);
        }
        if let Some(temperature) = self.manager_temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.manager_max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        builder.build()
    }
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_llm::CompletionResponse;
    use crew_llm::mock::ScriptedProvider;
    use crew_runtime::agents::DELEGATE_WORK;

    fn prompts() -> Arc<Prompts> {
        Arc::new(Prompts::builtin().unwrap())
    }

    fn agent(name: &str, role: &str, provider: &Arc<ScriptedProvider>) -> RoleAgent {
        RoleAgent::builder(name, provider.clone(), prompts())
            .role(role)
            .goal("Work on {{ ticket }}")
            .memory(true)
            .max_iter(3)
            .retry_policy(RetryPolicy::fast())
            .build()
            .unwrap()
    }

    struct Fixture {
        price: Arc<ScriptedProvider>,
        news: Arc<ScriptedProvider>,
        writer: Arc<ScriptedProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                price: Arc::new(ScriptedProvider::new().with_fallback("stock='AAPL, price UP'")),
                news: Arc::new(ScriptedProvider::new().with_fallback("BTC greed 70")),
                writer: Arc::new(ScriptedProvider::new().with_fallback("# Newsletter")),
            }
        }

        fn builder(&self) -> CrewBuilder {
            Crew::builder()
                .agent(agent("price", "Senior stock price Analyst", &self.price))
                .agent(agent("news", "Stock news Analyst", &self.news))
                .agent(agent("writer", "Senior Stock Analyst Writer", &self.writer))
        }

        fn tasks(&self, builder: CrewBuilder) -> CrewBuilder {
            builder
                .task(Task::new("get_stock_price", "Analyze {{ ticket }}", "A trend").agent("price"))
                .task(Task::new("get_news", "News for {{ ticket }}", "A summary").agent("news"))
                .task(
                    Task::new("write_analysis", "Write about {{ ticket }}", "A newsletter")
                        .agent("writer")
                        .context(["get_stock_price", "get_news"]),
                )
        }
    }

    fn last_user_prompt(provider: &ScriptedProvider) -> String {
        provider.requests()[0].messages[0].text().unwrap()
    }

    #[tokio::test]
    async fn test_sequential_kickoff() {
        let fixture = Fixture::new();
        let crew = fixture
            .tasks(fixture.builder())
            .full_output(true)
            .build()
            .unwrap();

        let output = crew.kickoff(&json!({ "ticket": "AAPL" })).await.unwrap();

        assert_eq!(output.final_output, "# Newsletter");
        let names: Vec<_> = output.tasks_output.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["get_stock_price", "get_news", "write_analysis"]);
        assert_eq!(output.tasks_output[1].agent, "Stock news Analyst");
        assert_eq!(output.tasks_output[0].description, "Analyze AAPL");
        assert!(Uuid::parse_str(&output.run_id).is_ok());

        let writer_prompt = last_user_prompt(&fixture.writer);
        assert!(writer_prompt.contains("Write about AAPL"));
        assert!(writer_prompt.contains("stock='AAPL, price UP'\n\n----------\n\nBTC greed 70"));

        // Without explicit context the news task sees every earlier output.
        assert!(last_user_prompt(&fixture.news).contains("stock='AAPL, price UP'"));
        assert!(last_user_prompt(&fixture.price).contains("Analyze AAPL"));
    }

    #[tokio::test]
    async fn test_explicit_context_limits_inputs() {
        let fixture = Fixture::new();
        let crew = fixture
            .builder()
            .task(Task::new("get_stock_price", "Analyze {{ ticket }}", "A trend").agent("price"))
            .task(Task::new("get_news", "News for {{ ticket }}", "A summary").agent("news"))
            .task(
                Task::new("write_analysis", "Write", "A newsletter")
                    .agent("writer")
                    .context(["get_news"]),
            )
            .build()
            .unwrap();

        let output = crew.kickoff(&json!({ "ticket": "AAPL" })).await.unwrap();
        assert!(output.tasks_output.is_empty());

        let prompt = last_user_prompt(&fixture.writer);
        let context = prompt
            .split("context you're working with:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\n").next())
            .unwrap();
        assert_eq!(context, "BTC greed 70");
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_llm() {
        let fixture = Fixture::new();
        let crew = fixture.tasks(fixture.builder()).build().unwrap();

        let err = crew.kickoff(&json!({ "ticker": "AAPL" })).await.unwrap_err();
        assert!(matches!(err, Error::Interpolation(_)));
        assert_eq!(fixture.price.call_count(), 0);
    }

    #[test]
    fn test_validation() {
        let fixture = Fixture::new();
        let expect_invalid = |builder: CrewBuilder, fragment: &str| {
            let err = builder.build().unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)));
            assert!(err.to_string().contains(fragment), "{err}");
        };

        expect_invalid(fixture.builder(), "at least one task");
        expect_invalid(
            fixture
                .builder()
                .task(Task::new("a", "d", "e").agent("price").context(["b"]))
                .task(Task::new("b", "d", "e").agent("price")),
            "not an earlier task",
        );
        expect_invalid(
            fixture.builder().task(Task::new("a", "d", "e").agent("trader")),
            "unknown agent 'trader'",
        );
        expect_invalid(
            fixture.builder().task(Task::new("a", "d", "e")),
            "has no agent",
        );
        expect_invalid(
            fixture
                .builder()
                .task(Task::new("a", "d", "e").agent("price"))
                .task(Task::new("a", "d", "e").agent("news")),
            "duplicate task name",
        );
        expect_invalid(
            fixture
                .builder()
                .agent(agent("price", "Other", &fixture.price))
                .task(Task::new("a", "d", "e").agent("price")),
            "duplicate agent name",
        );
        expect_invalid(
            fixture
                .builder()
                .process(Process::Hierarchical)
                .task(Task::new("a", "d", "e")),
            "manager LLM",
        );

        // Hierarchical tasks may leave the agent out.
        let crew = fixture
            .builder()
            .process(Process::Hierarchical)
            .manager_llm(Arc::new(ScriptedProvider::new()))
            .max_iter(7)
            .task(Task::new("a", "d", "e"))
            .build()
            .unwrap();
        let manager = crew.manager().unwrap();
        assert_eq!(manager.role(), MANAGER_ROLE);
        assert_eq!(manager.max_iter(), 7);
        assert!(manager.allows_delegation());
    }

    #[tokio::test]
    async fn test_manager_sampling_settings() {
        let fixture = Fixture::new();
        let manager_llm = Arc::new(ScriptedProvider::new().with_fallback("done"));

        let crew = fixture
            .builder()
            .process(Process::Hierarchical)
            .manager_llm(manager_llm.clone())
            .manager_temperature(0.1)
            .manager_max_tokens(300)
            .task(Task::new("get_news", "News for {{ ticket }}", "A summary"))
            .build()
            .unwrap();
        crew.kickoff(&json!({ "ticket": "AAPL" })).await.unwrap();

        let request = &manager_llm.requests()[0];
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, 300);
    }

    #[tokio::test]
    async fn test_hierarchical_manager_delegates() {
        let fixture = Fixture::new();
        let manager_llm = Arc::new(ScriptedProvider::with_responses([
            CompletionResponse::tool_call(
                "call_1",
                DELEGATE_WORK,
                json!({
                    "task": "Find news about AAPL and BTC",
                    "context": "Newsletter research",
                    "coworker": "stock news analyst"
                }),
            ),
            CompletionResponse::text("AAPL news: greed 70"),
        ]));

        let crew = fixture
            .builder()
            .process(Process::Hierarchical)
            .manager_llm(manager_llm.clone())
            .task(Task::new("get_news", "News for {{ ticket }}", "A summary").agent("news"))
            .build()
            .unwrap();

        let output = crew.kickoff(&json!({ "ticket": "AAPL" })).await.unwrap();
        assert_eq!(output.final_output, "AAPL news: greed 70");

        assert_eq!(fixture.news.call_count(), 1);
        assert_eq!(fixture.price.call_count(), 0);
        assert!(last_user_prompt(&fixture.news).contains("Find news about AAPL and BTC"));

        let manager_requests = manager_llm.requests();
        assert!(
            manager_requests[0]
                .system
                .as_deref()
                .unwrap()
                .starts_with("You are Crew Manager.")
        );
        let follow_up = format!("{:?}", manager_requests[1].messages.last().unwrap());
        assert!(follow_up.contains("BTC greed 70"));
    }

    #[tokio::test]
    async fn test_crew_as_agent() {
        let fixture = Fixture::new();
        let crew = fixture.tasks(fixture.builder()).name("newsletter").build().unwrap();

        let mut context = Context::new().with_input("ticket", "MSFT");
        let output = crew.process(String::new(), &mut context).await.unwrap();

        assert_eq!(output, "# Newsletter");
        assert!(context.run_id().is_some());
        assert_eq!(context.task_name(), Some("write_analysis"));
        assert_eq!(context.input("ticket"), Some("MSFT"));
        assert_eq!(crew.name(), "newsletter");
    }
}

//! Built-in prompts used by role agents
//!
//! Every template is rendered with all of its variables present; optional
//! values are passed as `null` since rendering is strict.

use crate::memory::MemoryEntry;
use crew_core::Result;
use crew_prompt::{JinjaTemplate, PromptRegistry};
use serde_json::{Value, json};

/// Template name of the agent system prompt
pub const AGENT_SYSTEM: &str = "agent_system";
/// Template name of the task prompt
pub const TASK: &str = "task";
/// Template name of the forced final answer prompt
pub const FINAL_ANSWER: &str = "final_answer";

const AGENT_SYSTEM_TEMPLATE: &str = "You are {{ role }}. {{ backstory }}
Your personal goal is: {{ goal }}
{%- if tools %}

You have access to the following tools:
{% for tool in tools %}- {{ tool.name }}: {{ tool.description }}
{% endfor %}
Use a tool whenever it helps you gather the information you need.
{%- endif %}
{%- if coworkers %}

You work with these coworkers: {{ coworkers | join(\", \") }}.
You can delegate work to them or ask them questions through your tools.
{%- endif %}";

const TASK_TEMPLATE: &str = "Current Task: {{ description }}

This is the expected criteria for your final answer: {{ expected_output }}
You MUST return the actual complete content as the final answer, not a summary.
{%- if context %}

This is the context you're working with:
{{ context }}
{%- endif %}
{%- if memory %}

This is the summary of your work so far:
{% for entry in memory %}- {{ entry.agent }} on '{{ entry.task }}': {{ entry.output }}
{% endfor %}
{%- endif %}

Begin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!";

const FINAL_ANSWER_TEMPLATE: &str = "You have reached the maximum number of steps. \
Do not use any more tools. Now it's time you MUST give your absolute best final answer, \
based on everything you have gathered so far.";

/// Registry of the prompts a role agent needs
pub struct Prompts {
    registry: PromptRegistry,
}

impl Prompts {
    /// Load the built-in prompt set
    pub fn builtin() -> Result<Self> {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new(AGENT_SYSTEM, AGENT_SYSTEM_TEMPLATE)?);
        registry.register(JinjaTemplate::new(TASK, TASK_TEMPLATE)?);
        registry.register(JinjaTemplate::new(FINAL_ANSWER, FINAL_ANSWER_TEMPLATE)?);
        Ok(Self { registry })
    }

    /// Replace one of the templates
    pub fn override_template(&self, name: &str, source: &str) -> Result<()> {
        self.registry.register(JinjaTemplate::new(name, source)?);
        Ok(())
    }

    /// Render the system prompt of an agent
    pub fn agent_system(
        &self,
        role: &str,
        goal: &str,
        backstory: &str,
        tools: &[(String, String)],
        coworkers: &[String],
    ) -> Result<String> {
        let tools: Vec<Value> = tools
            .iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect();
        self.render(
            AGENT_SYSTEM,
            &json!({
                "role": role,
                "goal": goal,
                "backstory": backstory,
                "tools": tools,
                "coworkers": coworkers,
            }),
        )
    }

    /// Render the user prompt of a task
    pub fn task(
        &self,
        description: &str,
        expected_output: &str,
        context: Option<&str>,
        memory: &[MemoryEntry],
    ) -> Result<String> {
        self.render(
            TASK,
            &json!({
                "description": description,
                "expected_output": expected_output,
                "context": context.filter(|c| !c.trim().is_empty()),
                "memory": memory,
            }),
        )
    }

    /// Render the forced final answer prompt
    pub fn final_answer(&self) -> Result<String> {
        self.render(FINAL_ANSWER, &json!({}))
    }

    fn render(&self, name: &str, vars: &Value) -> Result<String> {
        Ok(self.registry.render(name, vars)?)
    }
}

impl std::fmt::Debug for Prompts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompts")
            .field("templates", &self.registry.list())
            .finish()
    }
}

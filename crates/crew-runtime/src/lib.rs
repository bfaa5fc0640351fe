//! Agent runtime for crews of role agents
//!
//! This crate provides the runtime infrastructure for executing agents:
//! the AgentExecutor for LLM ⇄ tool loops, role agents with delegation,
//! per-run short-term memory, and the AgentRuntime factory.

pub mod agents;
pub mod executor;
pub mod memory;
pub mod prompts;
pub mod runtime;

// Re-export key types
pub use agents::{CoworkerTool, ExecutionScope, RoleAgent, RoleAgentBuilder, TaskPrompt};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutionResult, ExecutorConfig, ExecutorEventHandler,
    LoggingEventHandler, UsageMeter,
};
pub use memory::{MemoryEntry, ShortTermMemory};
pub use prompts::Prompts;
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};

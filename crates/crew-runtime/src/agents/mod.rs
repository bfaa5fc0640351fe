//! Concrete agent implementations
//!
//! - RoleAgent: role/goal/backstory persona running tasks through the executor loop
//! - CoworkerTool: the delegation tools a role agent gains when it has coworkers

pub mod delegation;
pub mod role;

pub use delegation::{ASK_QUESTION, CoworkerTool, DELEGATE_WORK};
pub use role::{ExecutionScope, RoleAgent, RoleAgentBuilder, TaskPrompt};

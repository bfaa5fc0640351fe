//! Crews: agents working through tasks, sequentially or under a manager
//!
//! A [`Crew`] holds role agents and an ordered list of [`Task`]s. Kickoff
//! interpolates the inputs into every agent and task, then runs the tasks in
//! order, either each with its own agent ([`Process::Sequential`]) or all
//! through a manager agent that delegates to the crew
//! ([`Process::Hierarchical`]).

pub mod crew;
pub mod output;
pub mod process;
pub mod task;

// Re-export for convenience
pub use crew::{Crew, CrewBuilder, MANAGER_NAME, MANAGER_ROLE};
pub use output::{CrewOutput, TaskOutput};
pub use process::{Process, Verbosity};
pub use task::Task;

//! Core abstractions for crews of LLM agents
//!
//! This crate defines the fundamental traits and types shared by the rest of
//! the workspace: the [`Agent`] trait, the run [`Context`] and the [`Error`] type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};

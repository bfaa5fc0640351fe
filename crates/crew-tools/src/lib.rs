//! Tool management and execution framework for crew agents
//!
//! This crate provides a framework for defining and executing tools (functions)
//! that agents can use to perform actions, a registry to look them up by name
//! and [`FnTool`] for turning an async closure into a tool.

pub mod function;
pub mod registry;
pub mod tool;

pub use function::FnTool;
pub use registry::ToolRegistry;
pub use tool::{Tool, string_arg};

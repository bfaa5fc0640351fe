//! Shared utilities for crew agents
//!
//! This crate provides common functionality used across the workspace:
//! tracing setup driven by crew verbosity and typed environment lookups.

pub mod env;
pub mod logging;

pub use env::{ConfigError, load_dotenv};
pub use logging::init_tracing;

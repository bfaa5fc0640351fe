//! Deterministic price analysis

pub mod trend;

pub use trend::{PriceSummary, Trend, downsample, summarize};

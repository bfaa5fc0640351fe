//! Stock newsletter crew
//!
//! Three role agents research a ticker and write a newsletter:
//!
//! - a price analyst reads a year of Yahoo Finance history and calls the trend
//! - a news analyst searches DuckDuckGo news for the stock and BTC and scores fear and greed
//! - a writer turns both reports into a three-paragraph markdown newsletter
//!
//! By default the crew is hierarchical: a manager agent runs every task and
//! delegates to the three. The [`web`] module serves the ticker form.
//!
//! # Example
//!
//! ```rust,no_run
//! use stock_newsletter::{NewsletterConfig, NewsletterCrew};
//!
//! # async fn example() -> stock_newsletter::Result<()> {
//! let newsletter = NewsletterCrew::from_config(NewsletterConfig::from_env()?)?;
//! let output = newsletter.research("AAPL").await?;
//! println!("{}", output.final_output);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod newsletter;
pub mod tasks;
pub mod tools;
pub mod web;

pub use config::NewsletterConfig;
pub use error::{NewsletterError, Result};
pub use newsletter::NewsletterCrew;

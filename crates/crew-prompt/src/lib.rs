//! Prompt templates for crew agents
//!
//! Agent roles, goals, backstories and task descriptions are templates over
//! the kickoff inputs. Placeholders use Jinja2 syntax (`{{ ticket }}`) and
//! interpolation is strict: a placeholder without a matching input is an
//! error rather than an empty string.
//!
//! # Quick Start
//!
//! ```
//! use crew_prompt::{JinjaTemplate, PromptRegistry, PromptTemplate, interpolate};
//! use serde_json::json;
//!
//! let text = interpolate("Analyze {{ ticket }}", &json!({ "ticket": "AAPL" })).unwrap();
//! assert_eq!(text, "Analyze AAPL");
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("greeting", "Hello, {{ name }}!").unwrap());
//! let greeting = registry.render("greeting", &json!({ "name": "World" })).unwrap();
//! assert_eq!(greeting, "Hello, World!");
//! ```

pub mod error;
pub mod jinja;
pub mod registry;
pub mod template;

pub use error::{PromptError, Result};
pub use jinja::{JinjaTemplate, interpolate};
pub use registry::PromptRegistry;
pub use template::PromptTemplate;

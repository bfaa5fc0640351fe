//! Core prompt template trait
//!
//! This module defines the [`PromptTemplate`] trait that all template implementations must follow.

use crate::Result;

/// Core trait for prompt templates
///
/// This trait is dyn-compatible, using `serde_json::Value` for variables instead of generics.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    ///
    /// Fails when a referenced variable is absent from `vars`.
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Get the raw template source (for debugging/inspection)
    fn raw_template(&self) -> &str;

    /// Whether the template contains any template syntax at all
    fn is_static(&self) -> bool {
        let raw = self.raw_template();
        !["{{", "{%", "{#"].iter().any(|marker| raw.contains(marker))
    }
}

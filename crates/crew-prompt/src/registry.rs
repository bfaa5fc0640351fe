//! Prompt template registry
//!
//! This module provides [`PromptRegistry`], a thread-safe registry for managing
//! and accessing prompt templates.

use crate::{PromptError, PromptTemplate, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe registry for managing prompt templates
///
/// # Examples
///
/// ```
/// use crew_prompt::{JinjaTemplate, PromptRegistry};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(JinjaTemplate::new("role", "You are {{ role }}.").unwrap());
///
/// let result = registry.render("role", &json!({ "role": "an analyst" })).unwrap();
/// assert_eq!(result, "You are an analyst.");
/// ```
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template
    ///
    /// If a template with the same name already exists, it will be replaced.
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        self.register_arc(Arc::new(template));
    }

    /// Register a template wrapped in Arc
    pub fn register_arc(&self, template: Arc<dyn PromptTemplate>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name().to_string(), template);
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Render a registered template
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// List all registered template names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Get the number of registered templates
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JinjaTemplate;
    use serde_json::json;

    #[test]
    fn test_register_and_get() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());

        registry.register(JinjaTemplate::new("test", "Hello").unwrap());

        assert!(registry.contains("test"));
        assert!(registry.get("test").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_replace_same_name() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("t", "one").unwrap());
        registry.register(JinjaTemplate::new("t", "two").unwrap());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.render("t", &json!({})).unwrap(), "two");
    }

    #[test]
    fn test_render_unregistered() {
        let registry = PromptRegistry::new();
        let result = registry.render("missing", &json!({}));
        assert!(matches!(result, Err(PromptError::TemplateNotRegistered(_))));
    }

    #[test]
    fn test_list_sorted() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("b", "x").unwrap());
        registry.register(JinjaTemplate::new("a", "y").unwrap());
        assert_eq!(registry.list(), vec!["a", "b"]);
    }
}

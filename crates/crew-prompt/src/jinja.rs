//! MiniJinja-based template implementation
//!
//! This module provides a [`JinjaTemplate`] implementation that uses the MiniJinja
//! template engine for variable interpolation and conditional rendering.

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};

/// A prompt template backed by MiniJinja
///
/// # Template Syntax
///
/// The template uses standard Jinja2 syntax:
/// - Variables: `{{ variable }}`
/// - Filters: `{{ name | upper }}`
/// - Conditionals: `{% if condition %}...{% endif %}`
/// - Loops: `{% for item in items %}...{% endfor %}`
///
/// Undefined variables are errors, including inside `if` tests, so callers
/// pass optional values explicitly as `null`.
///
/// # Examples
///
/// ```
/// use crew_prompt::{JinjaTemplate, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("task", "Analyze the stock {{ ticket }}").unwrap();
/// let result = template.render(&json!({ "ticket": "AAPL" })).unwrap();
/// assert_eq!(result, "Analyze the stock AAPL");
/// assert!(template.render(&json!({})).is_err());
/// ```
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, checking that it parses
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let template = Self { name, source };
        if !template.is_static() {
            let env = environment();
            env.template_from_str(&template.source)
                .map_err(|e| PromptError::TemplateParseFailed {
                    name: template.name.clone(),
                    detail: e.to_string(),
                })?;
        }

        Ok(template)
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        if self.is_static() {
            return Ok(self.source.clone());
        }

        let env = environment();
        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value).map_err(|e| {
            if e.kind() == ErrorKind::UndefinedError {
                PromptError::MissingVariable {
                    name: self.name.clone(),
                    detail: e.to_string(),
                }
            } else {
                PromptError::RenderError {
                    name: self.name.clone(),
                    detail: e.to_string(),
                }
            }
        })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Interpolate kickoff inputs into a piece of agent or task text
///
/// Text without template syntax is returned unchanged.
pub fn interpolate(text: &str, inputs: &serde_json::Value) -> Result<String> {
    JinjaTemplate::new("inline", text)?.render(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpolate_inputs() {
        let text = interpolate(
            "Make a detailed analysis of {{ ticket }} on {{ current_date }}",
            &json!({ "ticket": "TSLA", "current_date": "2024-08-08" }),
        )
        .unwrap();
        assert_eq!(text, "Make a detailed analysis of TSLA on 2024-08-08");
    }

    #[test]
    fn test_missing_input_is_error() {
        let err = interpolate("Stock: {{ ticket }}", &json!({ "ticker": "AAPL" })).unwrap_err();
        assert!(matches!(err, PromptError::MissingVariable { .. }));
    }

    #[test]
    fn test_strict_if_on_missing_variable() {
        let template = JinjaTemplate::new("t", "{% if context %}ctx{% endif %}").unwrap();
        assert!(template.render(&json!({})).is_err());
        assert_eq!(template.render(&json!({ "context": null })).unwrap(), "");
    }

    #[test]
    fn test_static_text_passes_through() {
        let text = "Use the format: stock='AAPL, price UP' {not a placeholder}";
        assert_eq!(interpolate(text, &json!({})).unwrap(), text);
    }

    #[test]
    fn test_trailing_newline_kept() {
        let text = interpolate("{{ a }}\n", &json!({ "a": 1 })).unwrap();
        assert_eq!(text, "1\n");
    }

    #[test]
    fn test_invalid_template_error() {
        let result = JinjaTemplate::new("test", "{{ unclosed");
        assert!(matches!(
            result,
            Err(PromptError::TemplateParseFailed { .. })
        ));
    }

    #[test]
    fn test_loop_and_filter() {
        let template = JinjaTemplate::new(
            "loop",
            "{% for item in items %}- {{ item | upper }}\n{% endfor %}",
        )
        .unwrap();
        let result = template
            .render(&json!({ "items": ["aapl", "btc"] }))
            .unwrap();
        assert_eq!(result, "- AAPL\n- BTC\n");
    }
}

//! HTML pages

use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::Result;

const INDEX_NAME: &str = "index.html";
const INDEX: &str = include_str!("../../templates/index.html");

/// What the page shows besides the form
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageView {
    /// Prefills the ticket field
    pub ticket: String,
    pub error: Option<String>,
    pub result: Option<String>,
}

impl PageView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn error(ticket: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            error: Some(error.into()),
            result: None,
        }
    }

    pub fn result(ticket: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            error: None,
            result: Some(result.into()),
        }
    }
}

/// Compiled page templates
///
/// Templates ending in `.html` are auto-escaped.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(INDEX_NAME, INDEX)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String> {
        let template = self.env.get_template(INDEX_NAME)?;
        Ok(template.render(context! {
            ticket => &view.ticket,
            error => &view.error,
            result => &view.result,
        })?)
    }
}

impl std::fmt::Debug for Pages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_page() {
        let html = Pages::new().unwrap().render(&PageView::empty()).unwrap();
        assert!(html.contains("Enter the Stock to Research"));
        assert!(html.contains("Select the ticket"));
        assert!(html.contains("Run Research"));
        assert!(!html.contains("Results of your research:"));
    }

    #[test]
    fn test_result_is_escaped() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(&PageView::result("AAPL", "<script>alert(1)</script> **up**"))
            .unwrap();
        assert!(html.contains("Results of your research:"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains(r#"value="AAPL""#));
    }

    #[test]
    fn test_error_page() {
        let html = Pages::new()
            .unwrap()
            .render(&PageView::error("", "Please fill the ticket field"))
            .unwrap();
        assert!(html.contains(r#"<div class="error">Please fill the ticket field</div>"#));
    }
}

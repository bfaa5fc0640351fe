//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template parsing failed
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    /// A placeholder had no matching variable
    #[error("Template '{name}' references a missing variable: {detail}")]
    MissingVariable { name: String, detail: String },

    /// Template rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// Template not registered in registry
    #[error("Template '{0}' not registered")]
    TemplateNotRegistered(String),
}

impl From<PromptError> for crew_core::Error {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::MissingVariable { .. } | PromptError::RenderError { .. } => {
                crew_core::Error::Interpolation(err.to_string())
            }
            other => crew_core::Error::InvalidConfiguration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_maps_to_interpolation() {
        let err = PromptError::MissingVariable {
            name: "task".to_string(),
            detail: "ticket is undefined".to_string(),
        };
        let core: crew_core::Error = err.into();
        assert!(matches!(core, crew_core::Error::Interpolation(_)));
    }

    #[test]
    fn test_unregistered_maps_to_configuration() {
        let core: crew_core::Error = PromptError::TemplateNotRegistered("x".to_string()).into();
        assert!(matches!(core, crew_core::Error::InvalidConfiguration(_)));
    }
}

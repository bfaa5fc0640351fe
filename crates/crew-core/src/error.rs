//! Error types for crew-core

use thiserror::Error;

/// Result type alias for crew-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent and crew operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or crew initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A crew, task or agent definition is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Kickoff inputs could not be interpolated into agent or task text
    #[error("Interpolation failed: {0}")]
    Interpolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfiguration("task 'a' has no agent".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: task 'a' has no agent");

        let err = Error::Interpolation("missing 'ticket'".to_string());
        assert_eq!(err.to_string(), "Interpolation failed: missing 'ticket'");
    }
}

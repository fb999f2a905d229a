//! Error types that stop a validation session before any check runs
//!
//! Failures inside a single check never surface here; they become that
//! check's [`CheckResult`](crate::CheckResult). Only problems that make the
//! whole run impossible (an unreadable configuration file, an inconsistent
//! registry) are reported through [`PreflightError`].

use thiserror::Error;

use crate::config::LoadError;
use crate::registry::RegistryError;

/// Session-level error type
#[derive(Error, Debug)]
pub enum PreflightError {
    /// Configuration document could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Registry is inconsistent (duplicate or unknown check names)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization of the report failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Writing the report to its output stream failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl PreflightError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PreflightError::InvalidInput(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        match self {
            PreflightError::Load(_) | PreflightError::InvalidInput(_) => true,
            PreflightError::Registry(e) => e.is_user_error(),
            PreflightError::Serialization(_) | PreflightError::Io(_) => false,
        }
    }
}

impl From<serde_json::Error> for PreflightError {
    fn from(err: serde_json::Error) -> Self {
        PreflightError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for PreflightError {
    fn from(err: serde_yaml::Error) -> Self {
        PreflightError::Serialization(format!("YAML error: {}", err))
    }
}

/// Result type alias for session-level operations
pub type Result<T> = std::result::Result<T, PreflightError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display() {
        let err = PreflightError::invalid_input("unknown output format");
        assert_eq!(err.to_string(), "Invalid input: unknown output format");
    }

    #[test]
    fn test_is_user_error() {
        assert!(PreflightError::invalid_input("x").is_user_error());
        assert!(
            PreflightError::Load(LoadError::UnsupportedFormat(PathBuf::from("a.ini")))
                .is_user_error()
        );
        assert!(!PreflightError::Registry(RegistryError::DuplicateName("a".into())).is_user_error());
        assert!(PreflightError::Registry(RegistryError::UnknownCheck("a".into())).is_user_error());
        assert!(!PreflightError::Serialization("x".into()).is_user_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let err = PreflightError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert!(matches!(err, PreflightError::Io(_)));
        assert_eq!(err.to_string(), "Failed to write output: closed");
        assert!(!err.is_user_error());
    }
}

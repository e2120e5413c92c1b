//! Profile error types.

use thiserror::Error;

/// Errors that can occur while loading a rule profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Unknown severity name.
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    /// Malformed profile document.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProfileError {
    /// Creates an invalid severity error.
    pub fn invalid_severity(name: impl Into<String>) -> Self {
        Self::InvalidSeverity(name.into())
    }

    /// Creates an invalid profile error.
    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile(message.into())
    }
}

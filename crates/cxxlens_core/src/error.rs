//! Analysis error types.

use thiserror::Error;

/// Errors that can occur while running an analysis.
///
/// None of these abort a whole run: the analyzer records them per tool and
/// carries on with the remaining tools.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external tool could not be started.
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The external tool exceeded its time limit.
    #[error("'{0}' timed out")]
    Timeout(String),

    /// The run was cancelled while the tool was running.
    #[error("'{0}' was cancelled")]
    Cancelled(String),

    /// Profile error.
    #[error("Profile error: {0}")]
    Profile(#[from] cxxlens_issue::ProfileError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a launch error.
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}

/// Why a single line or record of tool output could not be turned into an issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An expected delimiter was not found.
    #[error("missing '{0}' delimiter")]
    MissingDelimiter(char),

    /// The line number field was not a number.
    #[error("invalid line number: '{0}'")]
    InvalidLineNumber(String),

    /// A required field was empty or absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The structured report could not be read.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

//! Error types for the pgops library.
//!
//! Only conditions that stop an invocation from happening at all are errors.
//! Anything an external tool reports once it has started is classified into an
//! [`OperationOutcome`](crate::outcome::OperationOutcome) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before or while spawning external tools.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Missing or malformed connection configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// The executable could not be found on PATH
    #[error("`{tool}` was not found. {hint}")]
    ToolNotFound { tool: String, hint: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The executable exists but could not be started or awaited
    #[error("Failed to run `{tool}`: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> OpsError {
        OpsError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl OpsError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a file system error for `path`.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the error means the executable is missing.
    pub fn is_tool_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}

/// Result type alias for pgops operations
pub type Result<T> = std::result::Result<T, OpsError>;

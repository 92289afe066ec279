//! Error types for the read-only SQL guard.

use crate::security::Rejection;
use thiserror::Error;

/// Domain-specific errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Query rejected by the read-only policy
    #[error("Query rejected: {0}")]
    Rejected(#[from] Rejection),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error is a policy rejection rather than a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some("Check your environment variables and configuration"),
            Self::InvalidInput(_) => Some("Check the identifier or resource URI format"),
            Self::Rejected(_) => {
                Some("Only single read-only SELECT, SHOW, DESCRIBE, or EXPLAIN statements are accepted")
            }
            Self::Io(_) => None,
        }
    }
}

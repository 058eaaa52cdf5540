//! Error types for a3s-console

use thiserror::Error;

/// Errors that can occur while a panel talks to the agent backend
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The request never completed (connection refused, reset, timeout)
    #[error("Transport error on {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The backend answered with a non-2xx status
    #[error("HTTP error on {endpoint}: status {status}")]
    Http { endpoint: String, status: u16 },

    /// The backend answered 2xx but the body did not have the expected shape
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// Operator input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure outside a backend response
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`ConsoleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Http,
    MalformedResponse,
    Validation,
    Config,
    Serialization,
}

impl ConsoleError {
    pub fn transport(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Http { .. } => ErrorKind::Http,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Config,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

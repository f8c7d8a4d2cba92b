//! Error types for Monoliet operations
//!
//! Two layers of errors exist:
//!
//! - [`N8nError`]: failures raised by the n8n client. Every non-2xx response
//!   and every network fault becomes one of these; nothing is swallowed.
//! - [`ToolError`]: failures raised by a tool's `execute`. The tool contract
//!   collapses these into the fixed [`ErrorKind`] taxonomy before anything
//!   leaves a tool invocation.
//!
//! # Error Codes
//!
//! Each variant has a stable, upper-case error code (e.g. `N8N_NOT_FOUND`)
//! for logging and programmatic handling, and an HTTP status for the
//! management API.
//!
//! # Example
//!
//! ```rust
//! use monoliet_core::error::{ErrorKind, N8nError, ToolError};
//!
//! let err = N8nError::NotFound("Workflow 42 not found".to_string());
//! assert_eq!(err.http_status_code(), 404);
//! assert!(!err.is_retryable());
//!
//! let tool_err: ToolError = err.into();
//! assert_eq!(tool_err.kind(), ErrorKind::N8nError);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for n8n client operations
pub type N8nResult<T> = std::result::Result<T, N8nError>;

/// Result type alias for tool execution
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors raised by the n8n client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum N8nError {
    /// Network-level failure: connection refused, DNS, timeout
    #[error("{0}")]
    Connection(String),

    /// Upstream answered 401 or 403
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Upstream answered 404
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upstream answered 400
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-2xx answer
    #[error("n8n API error: {message}")]
    Remote { status: u16, message: String },

    /// 2xx answer whose body could not be decoded into the expected shape
    #[error("Invalid response from n8n: {0}")]
    InvalidResponse(String),

    /// The call was abandoned because the process is shutting down
    #[error("Request to n8n cancelled")]
    Cancelled,

    /// The HTTP client could not be constructed from the configuration
    #[error("Invalid n8n client configuration: {0}")]
    Configuration(String),
}

impl N8nError {
    /// A network-level failure with the standard message prefix
    pub fn connection(cause: impl std::fmt::Display) -> Self {
        N8nError::Connection(format!("Failed to connect to n8n: {}", cause))
    }

    /// Returns true if this error might succeed on retry
    ///
    /// Only network-level failures are retried. HTTP errors are
    /// deterministic and decode failures will not change on a second read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, N8nError::Connection(_))
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            N8nError::Connection(_) => "N8N_CONNECTION_ERROR",
            N8nError::Auth(_) => "N8N_AUTH_ERROR",
            N8nError::NotFound(_) => "N8N_NOT_FOUND",
            N8nError::Validation(_) => "N8N_VALIDATION_ERROR",
            N8nError::Remote { .. } => "N8N_API_ERROR",
            N8nError::InvalidResponse(_) => "N8N_INVALID_RESPONSE",
            N8nError::Cancelled => "N8N_CANCELLED",
            N8nError::Configuration(_) => "N8N_CLIENT_CONFIG",
        }
    }

    /// Returns the HTTP status code used by the management API
    ///
    /// Not-found maps to 404; every other upstream failure is reported as
    /// a 500 from our side.
    pub fn http_status_code(&self) -> u16 {
        match self {
            N8nError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// The fixed error classification every tool result collapses into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid tool argument
    ValidationError,
    /// Any failure originating from the n8n client
    N8nError,
    /// Anything unexpected
    InternalError,
}

impl ErrorKind {
    /// The wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::N8nError => "n8n_error",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a tool's `execute`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Explicitly signaled argument validation failure
    #[error("{0}")]
    Validation(String),

    /// Failure from the n8n client
    #[error(transparent)]
    Remote(#[from] N8nError),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation(message.into())
    }

    /// Shorthand for an internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        ToolError::Internal(message.into())
    }

    /// Classify this error into the fixed taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation(_) => ErrorKind::ValidationError,
            ToolError::Remote(_) => ErrorKind::N8nError,
            ToolError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.to_string())
    }
}

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set or is empty
    #[error("Missing required configuration: {name}")]
    Missing { name: &'static str },

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

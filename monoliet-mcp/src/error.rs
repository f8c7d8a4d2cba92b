//! Error types for the Monoliet MCP server

use monoliet_core::{ConfigError, N8nError};
use monoliet_server::ServerError;
use thiserror::Error;

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur in the MCP server
#[derive(Error, Debug)]
pub enum McpError {
    /// Line is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Valid JSON that is not a JSON-RPC request
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// MCP HTTP listen address could not be formed
    #[error("Invalid listen address '{0}'")]
    Address(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// n8n unreachable at startup or client construction failed
    #[error("n8n error: {0}")]
    N8n(#[from] N8nError),

    /// Management API failed to start or crashed
    #[error(transparent)]
    Management(#[from] ServerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl McpError {
    /// JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Parse(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::Serialization(_) => -32700,
            _ => -32603,
        }
    }
}

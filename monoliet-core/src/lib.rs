//! # Monoliet Core
//!
//! The tool dispatch and normalization core of the Monoliet n8n bridge:
//!
//! - **client**: async n8n REST client with retry, timeout, cancellation
//!   and status → error translation, behind the [`WorkflowBackend`] trait
//! - **tools**: the tool contract ([`Tool`], [`run`], [`Envelope`]) and the
//!   eleven workflow tools
//! - **config** / **logging**: explicit configuration value and tracing setup
//!
//! ## Architecture
//!
//! ```text
//!   MCP (stdio / HTTP)        Management API
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  list_workflows   get_workflow_details   │
//! │  create_workflow  update_workflow        │
//! │  activate / deactivate / delete          │
//! │  search_workflows execute_workflow       │
//! │  get_executions   get_workflow_health    │
//! └────────────────────┬─────────────────────┘
//!                      │ run(tool, args) → Envelope
//!                      ▼
//! ┌──────────────────────────────────────────┐
//! │      WorkflowBackend  (N8nClient)        │
//! │   retry · timeout · error mapping        │
//! └────────────────────┬─────────────────────┘
//!                      ▼
//!              n8n  /api/v1/...
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use monoliet_core::{Config, N8nClient, ToolRegistry};
//! use serde_json::json;
//!
//! let config = Config::from_env()?;
//! let client = Arc::new(N8nClient::new(&config)?);
//! let tools = ToolRegistry::with_default_tools(client);
//!
//! let envelope = tools.call("list_workflows", json!({"status": "active"})).await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod tools;

pub use client::{
    Execution, ExecutionFilter, ExecutionQuery, ExecutionStatus, HealthStatus, N8nClient,
    RetryPolicy, Workflow, WorkflowBackend, WorkflowStatistics,
};
pub use config::{Config, ConfigBuilder, LogFormat, RedactedConfig};
pub use error::{ConfigError, ErrorKind, N8nError, N8nResult, ToolError, ToolResult};
pub use tools::{run, Envelope, EnvelopeError, Tool, ToolArguments, ToolDefinition, ToolRegistry};

/// Crate version, reported by both front ends
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Tool contract and the workflow tool set
//!
//! A tool declares a name, a description and a JSON input schema, and
//! implements `execute`. Callers never invoke `execute` directly: [`run`] is
//! the single boundary that executes a tool and turns every outcome,
//! including a panic, into an [`Envelope`].
//!
//! ```text
//!   front end ──► run(tool, args) ──► Tool::execute ──► WorkflowBackend
//!                    │                     │
//!                    │   Ok(data)          │  ToolError::{Validation,Remote,Internal}
//!                    ▼                     ▼
//!              Envelope { success, data, error: { kind, message } }
//! ```

mod arguments;
pub mod executions;
pub mod health;
mod registry;
pub mod workflows;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use crate::error::{ErrorKind, ToolError, ToolResult};

/// Tool definition for MCP protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Description shown to the agent
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A named operation exposed to callers
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique identifier used for dispatch
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the accepted arguments (documentation only)
    fn input_schema(&self) -> Value;

    /// Validate, call the backend, reshape
    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Classified failure inside an [`Envelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Uniform result of every tool invocation
///
/// Exactly one of `data` and `error` is populated, gated by `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<EnvelopeError>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(EnvelopeError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// The error kind, if this is a failure
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl From<ToolResult<Value>> for Envelope {
    fn from(result: ToolResult<Value>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(err) => Envelope::failure(err.kind(), err.to_string()),
        }
    }
}

/// Execute `tool` and classify the outcome
///
/// Never fails and never panics: validation failures, backend failures and
/// anything unexpected all come back as an [`Envelope`].
pub async fn run(tool: &dyn Tool, arguments: Value) -> Envelope {
    let invocation_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("tool", tool = tool.name(), %invocation_id);

    async move {
        tracing::info!("Executing tool");

        let outcome = match ToolArguments::from_value(arguments) {
            Ok(args) => AssertUnwindSafe(tool.execute(&args))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ToolError::internal(panic_message(panic.as_ref())))),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(_) => tracing::info!("Tool execution successful"),
            Err(err @ ToolError::Validation(_)) => tracing::warn!(error = %err, "Validation error in tool"),
            Err(err @ ToolError::Remote(_)) => tracing::error!(error = %err, "n8n error in tool"),
            Err(err @ ToolError::Internal(_)) => tracing::error!(error = %err, "Unexpected error in tool"),
        }

        Envelope::from(outcome)
    }
    .instrument(span)
    .await
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

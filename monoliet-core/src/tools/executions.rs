//! Execution tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{Tool, ToolArguments};
use crate::client::{Execution, ExecutionFilter, ExecutionQuery, ExecutionStatus, WorkflowBackend};
use crate::error::{ToolError, ToolResult};

/// Bounds for `get_executions.limit`
pub const EXECUTIONS_LIMIT_RANGE: (i64, i64) = (1, 250);
pub const DEFAULT_EXECUTIONS_LIMIT: i64 = 20;

/// execute_workflow
pub struct ExecuteWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl ExecuteWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ExecuteWorkflow {
    fn name(&self) -> &'static str {
        "execute_workflow"
    }

    fn description(&self) -> &'static str {
        "Manually trigger execution of an n8n workflow. You can optionally provide input data to be passed to the workflow execution."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": { "type": "string", "description": "ID of the workflow to execute" },
                "data": {
                    "type": "object",
                    "description": "Optional input data to pass to the workflow",
                    "default": {}
                }
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let execution = self
            .backend
            .execute_workflow(&workflow_id, args.value("data"))
            .await?;

        let status = execution.status();
        let execution_id = execution.id.clone();

        Ok(json!({
            "execution_id": execution_id,
            "workflow_id": workflow_id,
            "status": status,
            "mode": execution.mode.as_deref().unwrap_or("manual"),
            "started_at": execution.started_at,
            "stopped_at": execution.stopped_at,
            "finished": execution.finished,
            "data": execution.data,
            "message": format!(
                "Workflow execution {}: {}",
                status.as_str(),
                execution_id.as_deref().unwrap_or("unknown")
            ),
        }))
    }
}

/// One row of a `get_executions` result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub id: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_name: Option<String>,
    pub mode: Option<String>,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
    pub finished: bool,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_data: Option<Value>,
}

impl ExecutionSummary {
    fn new(execution: Execution, include_data: bool) -> Self {
        let status = execution.status();
        let workflow_name = execution.workflow_name();
        let (data, execution_data) = if include_data {
            (
                Some(execution.data.unwrap_or(Value::Null)),
                Some(execution.extra.get("executionData").cloned().unwrap_or(Value::Null)),
            )
        } else {
            (None, None)
        };

        Self {
            id: execution.id,
            workflow_id: execution.workflow_id,
            workflow_name,
            mode: execution.mode,
            started_at: execution.started_at,
            stopped_at: execution.stopped_at,
            finished: execution.finished,
            status,
            data,
            execution_data,
        }
    }
}

/// get_executions
///
/// The summary counts cover the returned page only, not the full history.
pub struct GetExecutions {
    backend: Arc<dyn WorkflowBackend>,
}

impl GetExecutions {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetExecutions {
    fn name(&self) -> &'static str {
        "get_executions"
    }

    fn description(&self) -> &'static str {
        "Get execution history for n8n workflows. You can filter by workflow ID, status, and limit the number of results. Useful for monitoring workflow performance and debugging issues."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": {
                    "type": "string",
                    "description": "Filter executions by workflow ID (optional)"
                },
                "status": {
                    "type": "string",
                    "enum": ["success", "error", "waiting", "all"],
                    "description": "Filter executions by status",
                    "default": "all"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of executions to return",
                    "default": DEFAULT_EXECUTIONS_LIMIT,
                    "minimum": EXECUTIONS_LIMIT_RANGE.0,
                    "maximum": EXECUTIONS_LIMIT_RANGE.1
                },
                "include_data": {
                    "type": "boolean",
                    "description": "Include full execution data in response",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.str("workflow_id")?;
        let status = args.str_or("status", "all")?;
        let limit = args.integer_or("limit", DEFAULT_EXECUTIONS_LIMIT)?;
        let include_data = args.bool_or("include_data", false)?;

        let (min, max) = EXECUTIONS_LIMIT_RANGE;
        if !(min..=max).contains(&limit) {
            return Err(ToolError::validation(format!(
                "Limit must be between {} and {}",
                min, max
            )));
        }
        let filter = ExecutionFilter::parse(&status).ok_or_else(|| {
            ToolError::validation(format!(
                "Invalid status '{}'. Expected one of: success, error, waiting, all",
                status
            ))
        })?;

        let mut query = ExecutionQuery::new().limit(limit as u32).status(filter);
        if let Some(id) = &workflow_id {
            query = query.workflow(id.clone());
        }

        let executions: Vec<ExecutionSummary> = self
            .backend
            .get_executions(&query)
            .await?
            .into_iter()
            .map(|e| ExecutionSummary::new(e, include_data))
            .collect();

        let count = |wanted: ExecutionStatus| executions.iter().filter(|e| e.status == wanted).count();

        Ok(json!({
            "total_count": executions.len(),
            "success_count": count(ExecutionStatus::Success),
            "error_count": count(ExecutionStatus::Error),
            "running_count": count(ExecutionStatus::Running),
            "filters": {
                "workflow_id": workflow_id,
                "status": status,
                "limit": limit,
            },
            "executions": executions,
        }))
    }
}

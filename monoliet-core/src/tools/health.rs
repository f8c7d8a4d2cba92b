//! Workflow health scoring

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{Tool, ToolArguments};
use crate::client::{WorkflowBackend, WorkflowStatistics};
use crate::error::{ToolError, ToolResult};

/// Bounds for `get_workflow_health.limit`
pub const HEALTH_LIMIT_RANGE: (i64, i64) = (10, 1000);
pub const DEFAULT_HEALTH_LIMIT: i64 = 100;

/// Four-level label derived from the error rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthRating {
    /// 0 → excellent, below 5 → good, below 20 → fair, else poor
    pub fn from_error_rate(error_rate: f64) -> Self {
        if error_rate == 0.0 {
            HealthRating::Excellent
        } else if error_rate < 5.0 {
            HealthRating::Good
        } else if error_rate < 20.0 {
            HealthRating::Fair
        } else {
            HealthRating::Poor
        }
    }
}

/// Advice for an operator, several may apply at once
///
/// The "keep monitoring" fallback appears only when nothing else does.
pub fn recommendations(error_rate: f64, total_executions: usize, is_active: bool) -> Vec<&'static str> {
    let mut out = Vec::new();

    if error_rate > 20.0 {
        out.push("High error rate detected. Review workflow logs and fix failing nodes.");
    } else if error_rate > 5.0 {
        out.push("Moderate error rate. Consider investigating recent failures.");
    }

    if total_executions == 0 {
        if is_active {
            out.push("No executions found. Verify workflow triggers are configured correctly.");
        } else {
            out.push("Workflow is inactive and has no executions. Activate to start processing.");
        }
    }

    if total_executions > 0 && error_rate == 0.0 {
        out.push("Excellent! Workflow is running smoothly with no errors.");
    }

    if out.is_empty() {
        out.push("Workflow health is good. Continue monitoring for any issues.");
    }

    out
}

/// get_workflow_health
pub struct GetWorkflowHealth {
    backend: Arc<dyn WorkflowBackend>,
}

impl GetWorkflowHealth {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetWorkflowHealth {
    fn name(&self) -> &'static str {
        "get_workflow_health"
    }

    fn description(&self) -> &'static str {
        "Get health and performance statistics for a specific n8n workflow. Returns success rate, error rate, and execution counts based on recent execution history. Useful for monitoring workflow reliability."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": {
                    "type": "string",
                    "description": "ID of the workflow to check health for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of recent executions to analyze",
                    "default": DEFAULT_HEALTH_LIMIT,
                    "minimum": HEALTH_LIMIT_RANGE.0,
                    "maximum": HEALTH_LIMIT_RANGE.1
                }
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let limit = args.integer_or("limit", DEFAULT_HEALTH_LIMIT)?;

        let (min, max) = HEALTH_LIMIT_RANGE;
        if !(min..=max).contains(&limit) {
            return Err(ToolError::validation(format!(
                "Limit must be between {} and {}",
                min, max
            )));
        }

        let workflow = self.backend.get_workflow(&workflow_id).await?;
        let stats: WorkflowStatistics = self
            .backend
            .get_workflow_statistics(&workflow_id, limit as u32)
            .await?;

        let workflow_name = if workflow.name.is_empty() {
            "Unknown".to_string()
        } else {
            workflow.name
        };

        Ok(json!({
            "workflow_id": workflow_id,
            "workflow_name": workflow_name,
            "is_active": workflow.active,
            "health_status": HealthRating::from_error_rate(stats.error_rate),
            "statistics": {
                "total_executions": stats.total_executions,
                "success_count": stats.success_count,
                "error_count": stats.error_count,
                "waiting_count": stats.waiting_count,
                "success_rate": stats.success_rate,
                "error_rate": stats.error_rate,
                "analyzed_executions": stats.analyzed_executions,
            },
            "recommendations": recommendations(stats.error_rate, stats.total_executions, workflow.active),
        }))
    }
}

//! Workflow routes

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, NaiveDate, Utc};
use monoliet_core::client::percentage;
use monoliet_core::{Execution, ExecutionQuery, ExecutionStatus, Workflow};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState, PortalToken};

/// How many recent executions `/workflows/stats` inspects for today's figures
pub const STATS_EXECUTION_WINDOW: u32 = 250;

/// Aggregated workflow statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStats {
    pub total_workflows: usize,
    pub active_workflows: usize,
    pub paused_workflows: usize,
    /// Distinct workflows with a failed run today
    pub error_workflows: usize,
    pub total_executions_today: usize,
    pub success_rate: f64,
}

impl WorkflowStats {
    /// Counts over `workflows`; daily figures over the executions started on `today` (UTC)
    pub fn compute(workflows: &[Workflow], executions: &[Execution], today: NaiveDate) -> Self {
        let total = workflows.len();
        let active = workflows.iter().filter(|w| w.active).count();

        let todays: Vec<&Execution> = executions.iter().filter(|e| started_on(e, today)).collect();
        let successes = todays
            .iter()
            .filter(|e| e.status() == ExecutionStatus::Success)
            .count();
        let failing: HashSet<&str> = todays
            .iter()
            .filter(|e| e.status() == ExecutionStatus::Error)
            .filter_map(|e| e.workflow_id.as_deref())
            .collect();

        Self {
            total_workflows: total,
            active_workflows: active,
            paused_workflows: total - active,
            error_workflows: failing.len(),
            total_executions_today: todays.len(),
            success_rate: percentage(successes, todays.len()),
        }
    }
}

fn started_on(execution: &Execution, day: NaiveDate) -> bool {
    execution
        .started_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .is_some_and(|t| t.with_timezone(&Utc).date_naive() == day)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub active_only: bool,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowListResponse {
    pub workflows: Vec<Workflow>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub success: bool,
    pub workflow: Workflow,
}

#[derive(Debug, Serialize)]
pub struct WorkflowActionResponse {
    pub success: bool,
    pub workflow_id: String,
    pub data: Workflow,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub success: bool,
    pub workflow_id: String,
    pub execution_id: Option<String>,
}

pub async fn workflow_stats(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkflowStats>, ApiError> {
    const ACTION: &str = "Failed to fetch workflow stats";

    let workflows = state
        .backend
        .list_workflows(None, &[])
        .await
        .map_err(|e| ApiError::remote(ACTION, e))?;
    let executions = state
        .backend
        .get_executions(&ExecutionQuery::new().limit(STATS_EXECUTION_WINDOW))
        .await
        .map_err(|e| ApiError::remote(ACTION, e))?;

    Ok(Json(WorkflowStats::compute(
        &workflows,
        &executions,
        Utc::now().date_naive(),
    )))
}

pub async fn list_workflows(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<WorkflowListResponse>, ApiError> {
    let mut workflows = state
        .backend
        .list_workflows(None, &[])
        .await
        .map_err(|e| ApiError::remote("Failed to list workflows", e))?;

    if params.active_only {
        workflows.retain(|w| w.active);
    }
    if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        workflows.retain(|w| w.name.to_lowercase().contains(&needle));
    }

    Ok(Json(WorkflowListResponse {
        count: workflows.len(),
        workflows,
    }))
}

pub async fn get_workflow(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state
        .backend
        .get_workflow(&workflow_id)
        .await
        .map_err(|e| ApiError::remote("Failed to get workflow", e))?;

    Ok(Json(WorkflowResponse {
        success: true,
        workflow,
    }))
}

pub async fn activate_workflow(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowActionResponse>, ApiError> {
    let data = state
        .backend
        .activate_workflow(&workflow_id)
        .await
        .map_err(|e| ApiError::remote("Failed to activate workflow", e))?;

    Ok(Json(WorkflowActionResponse {
        success: true,
        workflow_id,
        data,
    }))
}

pub async fn deactivate_workflow(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowActionResponse>, ApiError> {
    let data = state
        .backend
        .deactivate_workflow(&workflow_id)
        .await
        .map_err(|e| ApiError::remote("Failed to deactivate workflow", e))?;

    Ok(Json(WorkflowActionResponse {
        success: true,
        workflow_id,
        data,
    }))
}

pub async fn execute_workflow(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<ExecutionResponse>, ApiError> {
    let execution = state
        .backend
        .execute_workflow(&workflow_id, None)
        .await
        .map_err(|e| ApiError::remote("Failed to execute workflow", e))?;

    Ok(Json(ExecutionResponse {
        success: true,
        workflow_id,
        execution_id: execution.id,
    }))
}

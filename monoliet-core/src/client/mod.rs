//! n8n remote client
//!
//! [`WorkflowBackend`] is the seam the tool set depends on. It declares one
//! method per remote operation; the derived operations (search, statistics,
//! activate/deactivate) are provided methods composed from the primitives so
//! every backend shares one implementation of them.
//!
//! [`N8nClient`] is the HTTP implementation against the n8n public API.

mod models;
mod n8n;
mod retry;

pub use models::{
    percentage, Execution, ExecutionStatus, HealthStatus, ListEnvelope, Tag, Workflow,
    WorkflowStatistics,
};
pub use n8n::N8nClient;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::N8nResult;

/// Default window for execution listings and statistics
pub const DEFAULT_EXECUTION_LIMIT: u32 = 100;

/// Upstream filter values for execution listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionFilter {
    Success,
    Error,
    Waiting,
}

impl ExecutionFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionFilter::Success => "success",
            ExecutionFilter::Error => "error",
            ExecutionFilter::Waiting => "waiting",
        }
    }

    /// Parse a caller-supplied status; `all` means no filter
    pub fn parse(value: &str) -> Option<Option<Self>> {
        match value {
            "all" => Some(None),
            "success" => Some(Some(ExecutionFilter::Success)),
            "error" => Some(Some(ExecutionFilter::Error)),
            "waiting" => Some(Some(ExecutionFilter::Waiting)),
            _ => None,
        }
    }
}

/// Parameters for listing executions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionQuery {
    pub workflow_id: Option<String>,
    pub limit: u32,
    pub status: Option<ExecutionFilter>,
}

impl Default for ExecutionQuery {
    fn default() -> Self {
        Self {
            workflow_id: None,
            limit: DEFAULT_EXECUTION_LIMIT,
            status: None,
        }
    }
}

impl ExecutionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn status(mut self, status: Option<ExecutionFilter>) -> Self {
        self.status = status;
        self
    }
}

/// Remote operations against a workflow engine
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// Lightweight liveness probe
    async fn health_check(&self) -> N8nResult<HealthStatus>;

    /// List workflows; `None`/empty filters are not sent
    async fn list_workflows(&self, active: Option<bool>, tags: &[String]) -> N8nResult<Vec<Workflow>>;

    async fn get_workflow(&self, id: &str) -> N8nResult<Workflow>;

    async fn create_workflow(&self, definition: &Workflow) -> N8nResult<Workflow>;

    async fn update_workflow(&self, id: &str, definition: &Workflow) -> N8nResult<Workflow>;

    /// `true` on success; any failure is an error, never `false`
    async fn delete_workflow(&self, id: &str) -> N8nResult<bool>;

    async fn execute_workflow(&self, id: &str, data: Option<&Value>) -> N8nResult<Execution>;

    async fn get_executions(&self, query: &ExecutionQuery) -> N8nResult<Vec<Execution>>;

    async fn get_execution(&self, id: &str) -> N8nResult<Execution>;

    async fn delete_execution(&self, id: &str) -> N8nResult<bool>;

    /// Set `active` through a full get → mutate → put
    ///
    /// Not atomic: a concurrent writer between the get and the put is
    /// overwritten (last write wins).
    async fn set_active(&self, id: &str, active: bool) -> N8nResult<Workflow> {
        let mut workflow = self.get_workflow(id).await?;
        workflow.active = active;
        let updated = self.update_workflow(id, &workflow).await?;
        tracing::info!(workflow_id = %id, active, "Workflow activation changed");
        Ok(updated)
    }

    async fn activate_workflow(&self, id: &str) -> N8nResult<Workflow> {
        self.set_active(id, true).await
    }

    async fn deactivate_workflow(&self, id: &str) -> N8nResult<Workflow> {
        self.set_active(id, false).await
    }

    /// Client-side search over the workflow list by name or tag
    async fn search_workflows(&self, query: &str, active: Option<bool>) -> N8nResult<Vec<Workflow>> {
        let matches: Vec<Workflow> = self
            .list_workflows(active, &[])
            .await?
            .into_iter()
            .filter(|w| w.matches_query(query))
            .collect();
        tracing::info!(query, matches = matches.len(), "Workflow search complete");
        Ok(matches)
    }

    /// Statistics over the `limit` most recent executions of a workflow
    async fn get_workflow_statistics(&self, workflow_id: &str, limit: u32) -> N8nResult<WorkflowStatistics> {
        let query = ExecutionQuery::new().workflow(workflow_id).limit(limit);
        let executions = self.get_executions(&query).await?;
        Ok(WorkflowStatistics::from_executions(workflow_id, &executions, limit))
    }
}

//! Workflow management tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{Tool, ToolArguments};
use crate::client::{Tag, Workflow, WorkflowBackend};
use crate::error::{ToolError, ToolResult};

/// Projection of a workflow used by list and search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub id: Option<String>,
    pub name: String,
    pub active: bool,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(w: &Workflow) -> Self {
        Self {
            id: w.id.clone(),
            name: w.name.clone(),
            active: w.active,
            tags: w.tag_names(),
            created_at: w.created_at.clone(),
            updated_at: w.updated_at.clone(),
        }
    }
}

fn summaries(workflows: &[Workflow]) -> Vec<WorkflowSummary> {
    workflows.iter().map(WorkflowSummary::from).collect()
}

/// The id n8n reported, falling back to the one the caller asked for
fn reported_id(workflow: &Workflow, requested: &str) -> String {
    workflow.id.clone().unwrap_or_else(|| requested.to_string())
}

fn workflow_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "workflow_id": {
                "type": "string",
                "description": description
            }
        },
        "required": ["workflow_id"]
    })
}

/// list_workflows
pub struct ListWorkflows {
    backend: Arc<dyn WorkflowBackend>,
}

impl ListWorkflows {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ListWorkflows {
    fn name(&self) -> &'static str {
        "list_workflows"
    }

    fn description(&self) -> &'static str {
        "List all n8n workflows. You can filter by active status to see only active or inactive workflows, or view all workflows."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["active", "inactive", "all"],
                    "description": "Filter workflows by activation status",
                    "default": "all"
                }
            }
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let status = args.str_or("status", "all")?;
        let active = match status.as_str() {
            "all" => None,
            "active" => Some(true),
            "inactive" => Some(false),
            other => {
                return Err(ToolError::validation(format!(
                    "Invalid status '{}'. Expected one of: active, inactive, all",
                    other
                )))
            }
        };

        let workflows = self.backend.list_workflows(active, &[]).await?;

        Ok(json!({
            "total_count": workflows.len(),
            "filter": status,
            "workflows": summaries(&workflows),
        }))
    }
}

/// get_workflow_details
pub struct GetWorkflowDetails {
    backend: Arc<dyn WorkflowBackend>,
}

impl GetWorkflowDetails {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetWorkflowDetails {
    fn name(&self) -> &'static str {
        "get_workflow_details"
    }

    fn description(&self) -> &'static str {
        "Get detailed information about a specific n8n workflow including its nodes, connections, settings, and metadata."
    }

    fn input_schema(&self) -> Value {
        workflow_id_schema("The ID of the workflow to retrieve")
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let workflow = self.backend.get_workflow(&workflow_id).await?;

        Ok(json!({
            "id": workflow.id,
            "name": workflow.name,
            "active": workflow.active,
            "tags": workflow.tag_names(),
            "nodes": workflow.nodes,
            "connections": workflow.connections,
            "settings": workflow.settings,
            "static_data": workflow.extra_field("staticData"),
            "created_at": workflow.created_at,
            "updated_at": workflow.updated_at,
            "node_count": workflow.nodes.len(),
            "version_id": workflow.extra_field("versionId"),
        }))
    }
}

/// Optional definition fields shared by create and update
struct DefinitionFields {
    name: Option<String>,
    nodes: Option<Vec<Value>>,
    connections: Option<Map<String, Value>>,
    settings: Option<Map<String, Value>>,
    tags: Option<Vec<String>>,
    active: Option<bool>,
}

impl DefinitionFields {
    fn from_args(args: &ToolArguments) -> ToolResult<Self> {
        Ok(Self {
            name: args.str("name")?,
            nodes: args.parse("nodes")?,
            connections: args.parse("connections")?,
            settings: args.parse("settings")?,
            tags: args.parse("tags")?,
            active: args.parse("active")?,
        })
    }

    /// Overlay supplied fields onto `workflow`; absent fields keep their value
    fn apply(self, workflow: &mut Workflow) {
        if let Some(name) = self.name {
            workflow.name = name;
        }
        if let Some(nodes) = self.nodes {
            workflow.nodes = nodes;
        }
        if let Some(connections) = self.connections {
            workflow.connections = connections;
        }
        if let Some(settings) = self.settings {
            workflow.settings = settings;
        }
        if let Some(tags) = self.tags {
            workflow.tags = tags.into_iter().map(Tag::from).collect();
        }
        if let Some(active) = self.active {
            workflow.active = active;
        }
    }
}

/// create_workflow
pub struct CreateWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl CreateWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CreateWorkflow {
    fn name(&self) -> &'static str {
        "create_workflow"
    }

    fn description(&self) -> &'static str {
        "Create a new n8n workflow. You need to provide at minimum a workflow name. Optionally include nodes, connections, and other workflow configuration."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Name of the workflow" },
                "nodes": { "type": "array", "description": "Array of node definitions", "default": [] },
                "connections": { "type": "object", "description": "Node connections definition", "default": {} },
                "settings": { "type": "object", "description": "Workflow settings", "default": {} },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Tags for organizing workflows",
                    "default": []
                },
                "active": {
                    "type": "boolean",
                    "description": "Whether to activate the workflow immediately",
                    "default": false
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let name = args.required_str("name")?;
        let mut definition = Workflow::definition(name);
        DefinitionFields::from_args(args)?.apply(&mut definition);

        let created = self.backend.create_workflow(&definition).await?;

        Ok(json!({
            "id": created.id,
            "name": created.name,
            "active": created.active,
            "created_at": created.created_at,
            "message": format!("Successfully created workflow '{}'", created.name),
        }))
    }
}

/// update_workflow
pub struct UpdateWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl UpdateWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for UpdateWorkflow {
    fn name(&self) -> &'static str {
        "update_workflow"
    }

    fn description(&self) -> &'static str {
        "Update an existing n8n workflow. You can update the name, nodes, connections, settings, tags, and activation status."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": { "type": "string", "description": "ID of the workflow to update" },
                "name": { "type": "string", "description": "New name for the workflow" },
                "nodes": { "type": "array", "description": "Updated array of node definitions" },
                "connections": { "type": "object", "description": "Updated node connections" },
                "settings": { "type": "object", "description": "Updated workflow settings" },
                "tags": { "type": "array", "items": { "type": "string" }, "description": "Updated tags" },
                "active": { "type": "boolean", "description": "Updated activation status" }
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let fields = DefinitionFields::from_args(args)?;

        let mut workflow = self.backend.get_workflow(&workflow_id).await?;
        fields.apply(&mut workflow);

        let updated = self
            .backend
            .update_workflow(&workflow_id, &workflow.writable())
            .await?;

        Ok(json!({
            "id": reported_id(&updated, &workflow_id),
            "name": updated.name,
            "active": updated.active,
            "updated_at": updated.updated_at,
            "message": format!("Successfully updated workflow '{}'", updated.name),
        }))
    }
}

/// activate_workflow
pub struct ActivateWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl ActivateWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ActivateWorkflow {
    fn name(&self) -> &'static str {
        "activate_workflow"
    }

    fn description(&self) -> &'static str {
        "Activate an n8n workflow to start processing triggers and webhooks. The workflow must be properly configured before activation."
    }

    fn input_schema(&self) -> Value {
        workflow_id_schema("ID of the workflow to activate")
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let workflow = self.backend.activate_workflow(&workflow_id).await?;

        Ok(json!({
            "id": reported_id(&workflow, &workflow_id),
            "name": workflow.name,
            "active": workflow.active,
            "message": format!("Successfully activated workflow '{}'", workflow.name),
        }))
    }
}

/// deactivate_workflow
pub struct DeactivateWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl DeactivateWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for DeactivateWorkflow {
    fn name(&self) -> &'static str {
        "deactivate_workflow"
    }

    fn description(&self) -> &'static str {
        "Deactivate an n8n workflow to stop processing triggers and webhooks. The workflow will no longer execute automatically."
    }

    fn input_schema(&self) -> Value {
        workflow_id_schema("ID of the workflow to deactivate")
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let workflow_id = args.required_str("workflow_id")?;
        let workflow = self.backend.deactivate_workflow(&workflow_id).await?;

        Ok(json!({
            "id": reported_id(&workflow, &workflow_id),
            "name": workflow.name,
            "active": workflow.active,
            "message": format!("Successfully deactivated workflow '{}'", workflow.name),
        }))
    }
}

/// delete_workflow
///
/// Only a literal `confirm: true` lets the delete through. Absent, `false`
/// or any non-boolean value is rejected before n8n is contacted.
pub struct DeleteWorkflow {
    backend: Arc<dyn WorkflowBackend>,
}

impl DeleteWorkflow {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for DeleteWorkflow {
    fn name(&self) -> &'static str {
        "delete_workflow"
    }

    fn description(&self) -> &'static str {
        "Permanently delete an n8n workflow. This action cannot be undone. Make sure to deactivate the workflow first if it's active."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": { "type": "string", "description": "ID of the workflow to delete" },
                "confirm": {
                    "type": "boolean",
                    "description": "Confirmation flag to prevent accidental deletion",
                    "default": false
                }
            },
            "required": ["workflow_id", "confirm"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        args.require(&["workflow_id", "confirm"])?;
        if args.value("confirm") != Some(&Value::Bool(true)) {
            return Err(ToolError::validation(
                "Deletion requires explicit confirmation. Set 'confirm' to true.",
            ));
        }
        let workflow_id = args.required_str("workflow_id")?;

        let workflow = self.backend.get_workflow(&workflow_id).await?;
        let name = if workflow.name.is_empty() {
            "Unknown".to_string()
        } else {
            workflow.name
        };

        self.backend.delete_workflow(&workflow_id).await?;

        Ok(json!({
            "id": workflow_id,
            "name": name,
            "deleted": true,
            "message": format!("Successfully deleted workflow '{}'", name),
        }))
    }
}

/// search_workflows
pub struct SearchWorkflows {
    backend: Arc<dyn WorkflowBackend>,
}

impl SearchWorkflows {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for SearchWorkflows {
    fn name(&self) -> &'static str {
        "search_workflows"
    }

    fn description(&self) -> &'static str {
        "Search for n8n workflows by name or tags. Returns workflows that match the search query in their name or tag list."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query to match against workflow names and tags"
                },
                "active_only": {
                    "type": "boolean",
                    "description": "Only return active workflows",
                    "default": false
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: &ToolArguments) -> ToolResult<Value> {
        let query = args.required_str("query")?;
        let active_only = args.bool_or("active_only", false)?;

        let workflows = self
            .backend
            .search_workflows(&query, active_only.then_some(true))
            .await?;

        Ok(json!({
            "query": query,
            "total_matches": workflows.len(),
            "active_filter": active_only,
            "workflows": summaries(&workflows),
        }))
    }
}

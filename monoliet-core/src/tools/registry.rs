//! Name → tool lookup

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::{executions, health, run, workflows, Envelope, Tool, ToolDefinition};
use crate::client::WorkflowBackend;

/// Registered tools in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The eleven workflow tools over `backend`, in catalog order
    pub fn with_default_tools(backend: Arc<dyn WorkflowBackend>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(workflows::ListWorkflows::new(backend.clone())));
        registry.register(Arc::new(workflows::GetWorkflowDetails::new(backend.clone())));
        registry.register(Arc::new(workflows::CreateWorkflow::new(backend.clone())));
        registry.register(Arc::new(workflows::UpdateWorkflow::new(backend.clone())));
        registry.register(Arc::new(workflows::ActivateWorkflow::new(backend.clone())));
        registry.register(Arc::new(workflows::DeactivateWorkflow::new(backend.clone())));
        registry.register(Arc::new(workflows::DeleteWorkflow::new(backend.clone())));
        registry.register(Arc::new(workflows::SearchWorkflows::new(backend.clone())));
        registry.register(Arc::new(executions::ExecuteWorkflow::new(backend.clone())));
        registry.register(Arc::new(executions::GetExecutions::new(backend.clone())));
        registry.register(Arc::new(health::GetWorkflowHealth::new(backend)));
        tracing::debug!(count = registry.len(), "Registered tools");
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        match self.index.get(name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.tools[slot]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Metadata for every tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name; `None` when no such tool is registered
    pub async fn call(&self, name: &str, arguments: Value) -> Option<Envelope> {
        let tool = self.get(name)?;
        Some(run(tool.as_ref(), arguments).await)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

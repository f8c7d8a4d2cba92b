//! Pre-flight checks for `monoliet-mcp check`

use std::io::{self, Write};
use std::sync::Arc;

use monoliet_core::{Config, ExecutionQuery, N8nError, ToolRegistry, WorkflowBackend};

/// Number of tools a healthy installation registers
pub const EXPECTED_TOOLS: usize = 11;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
        }
    }
}

/// Run every check against `backend`
pub async fn run_checks(config: &Config, backend: Arc<dyn WorkflowBackend>) -> Vec<CheckOutcome> {
    let mut outcomes = vec![CheckOutcome::pass(
        "Configuration",
        format!("n8n URL: {}", config.n8n_url),
    )];

    outcomes.push(match backend.health_check().await {
        Ok(health) => CheckOutcome::pass("n8n Connection", health.message),
        Err(e) => CheckOutcome::fail("n8n Connection", format!("Cannot connect to n8n: {}", e)),
    });

    outcomes.push(match backend.list_workflows(None, &[]).await {
        Ok(workflows) => CheckOutcome::pass(
            "Workflow Listing",
            format!("Found {} workflow(s)", workflows.len()),
        ),
        Err(e) => CheckOutcome::fail("Workflow Listing", e.to_string()),
    });

    let permissions = match backend.list_workflows(None, &[]).await {
        Ok(_) => backend.get_executions(&ExecutionQuery::new().limit(1)).await.map(|_| ()),
        Err(e) => Err(e),
    };
    outcomes.push(match permissions {
        Ok(()) => CheckOutcome::pass("API Permissions", "API key has read permissions"),
        Err(N8nError::Auth(_)) => CheckOutcome::fail(
            "API Permissions",
            "API key invalid or insufficient permissions",
        ),
        Err(e) => CheckOutcome::fail("API Permissions", e.to_string()),
    });

    let tools = ToolRegistry::with_default_tools(backend);
    outcomes.push(if tools.len() == EXPECTED_TOOLS {
        CheckOutcome::pass("MCP Tools", format!("All {} tools registered", tools.len()))
    } else {
        CheckOutcome::fail(
            "MCP Tools",
            format!("Expected {} tools, found {}", EXPECTED_TOOLS, tools.len()),
        )
    });

    outcomes
}

/// Print one PASS/FAIL line per check and a summary
pub fn render(outcomes: &[CheckOutcome], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Monoliet MCP Server - Health Check")?;
    writeln!(out)?;

    for outcome in outcomes {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        writeln!(out, "[{}] {}: {}", status, outcome.name, outcome.message)?;
    }

    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = outcomes.len() - passed;
    writeln!(out)?;
    writeln!(
        out,
        "Total checks: {}, passed: {}, failed: {}",
        outcomes.len(),
        passed,
        failed
    )?;

    if failed == 0 {
        writeln!(out, "All health checks passed. Server is ready.")?;
    } else {
        writeln!(out, "Some health checks failed:")?;
        writeln!(out, "- Verify n8n is running")?;
        writeln!(out, "- Check N8N_URL")?;
        writeln!(out, "- Verify N8N_API_KEY is correct")?;
        writeln!(out, "- Ensure the n8n public API is enabled")?;
    }

    Ok(())
}

pub fn all_passed(outcomes: &[CheckOutcome]) -> bool {
    outcomes.iter().all(|o| o.passed)
}

//! Monoliet MCP Server Binary
//!
//! Serves the n8n workflow tools over MCP and runs the management API
//! alongside.
//!
//! ## Usage
//!
//! ```bash
//! # MCP over stdio (Claude Desktop)
//! N8N_URL=http://localhost:5678 N8N_API_KEY=... monoliet-mcp
//!
//! # MCP over HTTP
//! MCP_SERVER_MODE=http monoliet-mcp
//!
//! # Pre-flight checks
//! monoliet-mcp check
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use monoliet_core::{logging, Config, N8nClient, ToolRegistry, WorkflowBackend};
use monoliet_mcp::check::{self, CheckOutcome};
use monoliet_mcp::{HttpServer, McpError, McpResult, McpServer};
use monoliet_server::{signal, ManagementServer};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// JSON-RPC over stdin/stdout
    Stdio,
    /// `/call`, `/tools` and `/health` over HTTP
    Http,
}

#[derive(Debug, Parser)]
#[command(name = "monoliet-mcp", version, about = "MCP bridge to n8n workflow automation")]
struct Cli {
    /// MCP transport
    #[arg(long, env = "MCP_SERVER_MODE", value_enum, ignore_case = true, default_value_t = Mode::Stdio)]
    mode: Mode,

    /// Do not start the management API
    #[arg(long)]
    no_management: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify configuration and n8n connectivity, then exit
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Command::Check) = cli.command {
        return run_check().await;
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

async fn run_check() -> ExitCode {
    let outcomes = match Config::from_env() {
        Err(e) => vec![CheckOutcome::fail("Configuration", e.to_string())],
        Ok(config) => match N8nClient::new(&config) {
            Ok(client) => check::run_checks(&config, Arc::new(client)).await,
            Err(e) => vec![
                CheckOutcome::pass("Configuration", format!("n8n URL: {}", config.n8n_url)),
                CheckOutcome::fail("n8n Connection", e.to_string()),
            ],
        },
    };

    let mut stdout = std::io::stdout();
    if let Err(e) = check::render(&outcomes, &mut stdout) {
        eprintln!("Failed to write report: {}", e);
        return ExitCode::FAILURE;
    }

    if check::all_passed(&outcomes) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli, config: Config) -> McpResult<()> {
    tracing::info!("Starting Monoliet MCP Server v{}", monoliet_mcp::SERVER_VERSION);

    let shutdown = CancellationToken::new();
    let client = Arc::new(N8nClient::new(&config)?.with_cancellation(shutdown.child_token()));

    let health = client.health_check().await?;
    tracing::info!(url = %health.url, "n8n connection validated: {}", health.message);

    let backend: Arc<dyn WorkflowBackend> = client.clone();
    let tools = ToolRegistry::with_default_tools(Arc::clone(&backend));
    tracing::info!(count = tools.len(), "Registered tools");

    tokio::spawn(signal::wait_for_signal(shutdown.clone()));

    let management = if cli.no_management {
        None
    } else {
        let server = ManagementServer::new(config.clone(), Arc::clone(&backend));
        let token = shutdown.clone();
        Some(tokio::spawn(async move { server.run(token).await }))
    };

    tracing::info!(mode = ?cli.mode, "MCP server mode");
    let result = match cli.mode {
        Mode::Stdio => McpServer::new(tools).run_stdio(shutdown.clone()).await,
        Mode::Http => {
            let raw = format!("{}:{}", config.mcp_server_host, config.mcp_server_port);
            let addr: SocketAddr = raw.parse().map_err(|_| McpError::Address(raw.clone()))?;
            HttpServer::new(tools, backend, config.mcp_auth_token.clone(), addr)
                .run(shutdown.clone())
                .await
        }
    };

    // Either transport ending stops the whole process
    shutdown.cancel();

    if let Some(handle) = management {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Management API failed"),
            Err(e) => tracing::error!(error = %e, "Management API task panicked"),
        }
    }

    client.close();
    tracing::info!("Server shutdown complete");
    result
}

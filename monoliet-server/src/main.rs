//! Monoliet Management API Binary
//!
//! Runs the management API on its own, without an MCP front end.
//!
//! ## Usage
//!
//! ```bash
//! N8N_URL=http://localhost:5678 N8N_API_KEY=... monoliet-server
//!
//! # Custom port
//! MANAGEMENT_API_PORT=9002 monoliet-server
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use monoliet_core::{logging, Config, N8nClient};
use monoliet_server::{signal, ManagementServer};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config);

    tracing::info!("Starting Monoliet Management API v{}", monoliet_core::VERSION);

    let shutdown = CancellationToken::new();
    let client = match N8nClient::new(&config) {
        Ok(client) => Arc::new(client.with_cancellation(shutdown.child_token())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create n8n client");
            return ExitCode::FAILURE;
        }
    };

    tokio::spawn(signal::wait_for_signal(shutdown.clone()));

    let server = ManagementServer::new(config, client.clone());
    let result = server.run(shutdown).await;
    client.close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Management API failed");
            ExitCode::FAILURE
        }
    }
}

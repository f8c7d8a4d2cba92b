//! Monoliet Management API
//!
//! REST surface the operator portal uses to monitor the bridge and drive
//! n8n workflows without going through MCP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  ManagementServer                    │
//! │                                                      │
//! │   GET /  GET /health            (no auth)            │
//! │   GET /status  GET /config  PUT /config              │
//! │   GET /workflows  GET /workflows/stats               │
//! │   GET /workflows/:id                                 │
//! │   POST /workflows/:id/{activate,deactivate,execute}  │
//! │                        │          (Bearer token)     │
//! │                        ▼                             │
//! │         Arc<dyn WorkflowBackend> (shared client)     │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod error;
pub mod routes;
pub mod signal;

pub use auth::PortalToken;
pub use error::{ApiError, ServerError};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use monoliet_core::{Config, WorkflowBackend};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn WorkflowBackend>,
    /// Reference point for `uptime_seconds`
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn WorkflowBackend>) -> Self {
        Self {
            config,
            backend,
            started_at: Instant::now(),
        }
    }
}

/// Management HTTP server
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use monoliet_core::{Config, N8nClient};
/// use monoliet_server::ManagementServer;
///
/// let config = Config::from_env()?;
/// let client = Arc::new(N8nClient::new(&config)?);
/// let server = ManagementServer::new(config, client);
/// server.run(CancellationToken::new()).await?;
/// ```
pub struct ManagementServer {
    state: Arc<AppState>,
}

impl ManagementServer {
    pub fn new(config: Config, backend: Arc<dyn WorkflowBackend>) -> Self {
        Self {
            state: Arc::new(AppState::new(config, backend)),
        }
    }

    /// Build the Axum router with all routes
    pub fn router(&self) -> Router {
        routes::create_router(Arc::clone(&self.state))
    }

    /// Listens on every interface
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.state.config.management_api_port))
    }

    /// Serve until `shutdown` is cancelled, then drain in-flight requests
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let app = self.router();
        let addr = self.addr();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!("Management API listening on http://{}", addr);
        tracing::info!("Endpoints:");
        tracing::info!("  GET  /health");
        tracing::info!("  GET  /status");
        tracing::info!("  GET  /workflows");
        tracing::info!("  GET  /workflows/stats");
        tracing::info!("  GET  /workflows/:id");
        tracing::info!("  POST /workflows/:id/activate");
        tracing::info!("  POST /workflows/:id/deactivate");
        tracing::info!("  POST /workflows/:id/execute");
        tracing::info!("  GET  /config");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("Management API stopped");
        Ok(())
    }
}

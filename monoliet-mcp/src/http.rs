//! MCP over plain HTTP
//!
//! For remote agents that cannot spawn a stdio process:
//!
//! - `POST /call`  `{tool, arguments}` → the tool's envelope
//! - `GET /tools`  → `{tools, count}`
//! - `GET /health` → n8n reachability, 503 when n8n is down

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use monoliet_core::{ToolRegistry, WorkflowBackend};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::error::McpResult;

/// Shared state of the HTTP front end
pub struct HttpState {
    pub tools: ToolRegistry,
    pub backend: Arc<dyn WorkflowBackend>,
    /// Bearer token required on `/call` and `/tools` when set
    pub auth_token: Option<String>,
}

/// `POST /call` body
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub tool: Option<String>,
    #[serde(default)]
    pub arguments: Value,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Extractor that admits a caller holding the configured bearer token
///
/// Runs before the body is read, so an unauthenticated request is rejected
/// with 401 whatever its payload.
pub struct CallerAuth;

#[axum::async_trait]
impl FromRequestParts<Arc<HttpState>> for CallerAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<HttpState>) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.auth_token.as_deref() else {
            return Ok(CallerAuth);
        };
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim() == expected);

        if presented {
            Ok(CallerAuth)
        } else {
            Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

async fn call_tool(
    _auth: CallerAuth,
    State(state): State<Arc<HttpState>>,
    Json(request): Json<CallRequest>,
) -> Response {
    let Some(name) = request.tool.filter(|t| !t.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing tool name");
    };

    match state.tools.call(&name, request.arguments).await {
        Some(envelope) => Json(envelope).into_response(),
        None => {
            tracing::error!(tool = %name, "Unknown tool");
            error_response(StatusCode::NOT_FOUND, format!("Unknown tool: {}", name))
        }
    }
}

async fn list_tools(_auth: CallerAuth, State(state): State<Arc<HttpState>>) -> Response {
    let tools = state.tools.definitions();
    Json(json!({ "count": tools.len(), "tools": tools })).into_response()
}

async fn health(State(state): State<Arc<HttpState>>) -> Response {
    match state.backend.health_check().await {
        Ok(n8n) => Json(json!({
            "status": "healthy",
            "n8n": n8n,
            "tools_count": state.tools.len(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/call", post(call_tool))
        .route("/tools", get(list_tools))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// MCP HTTP server
pub struct HttpServer {
    state: Arc<HttpState>,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(
        tools: ToolRegistry,
        backend: Arc<dyn WorkflowBackend>,
        auth_token: Option<String>,
        addr: SocketAddr,
    ) -> Self {
        Self {
            state: Arc::new(HttpState {
                tools,
                backend,
                auth_token,
            }),
            addr,
        }
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        tracing::info!("MCP HTTP server listening on http://{}", self.addr);
        tracing::info!("Endpoints:");
        tracing::info!("  POST /call   - Execute tools");
        tracing::info!("  GET  /tools  - List tools");
        tracing::info!("  GET  /health - Health check");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("MCP HTTP server stopped");
        Ok(())
    }
}

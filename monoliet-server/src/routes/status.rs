//! Service descriptor, health and status routes

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{AppState, PortalToken};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub n8n_reachable: bool,
    /// Always true; the service keeps no database
    pub database_connected: bool,
    pub errors: Vec<String>,
}

/// Server status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `operational` when n8n answers, `degraded` otherwise
    pub status: &'static str,
    pub uptime_seconds: f64,
    pub n8n_connected: bool,
    pub n8n_url: String,
    pub mcp_port: u16,
    pub management_port: u16,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Monoliet MCP Management API",
        "version": monoliet_core::VERSION,
        "health": "/health",
        "status": "/status",
    }))
}

/// Liveness probe for container health checks, no auth
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut errors = Vec::new();

    let n8n_reachable = match state.backend.health_check().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: n8n unreachable");
            errors.push(format!("n8n unreachable: {}", e));
            false
        }
    };

    Json(HealthResponse {
        healthy: n8n_reachable && errors.is_empty(),
        n8n_reachable,
        database_connected: true,
        errors,
    })
}

pub async fn status(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
) -> Json<StatusResponse> {
    let n8n_connected = match state.backend.health_check().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Status check: n8n connection failed");
            false
        }
    };

    Json(StatusResponse {
        status: if n8n_connected { "operational" } else { "degraded" },
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        n8n_connected,
        n8n_url: state.config.n8n_url.clone(),
        mcp_port: state.config.mcp_server_port,
        management_port: state.config.management_api_port,
        version: monoliet_core::VERSION,
        timestamp: Utc::now(),
    })
}

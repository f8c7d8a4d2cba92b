//! HTTP route handlers

mod config;
mod status;
mod workflows;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Origins of a locally running portal
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:8000", "http://127.0.0.1:8000"];

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.portal_url.as_deref());

    Router::new()
        .route("/", get(status::root))
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/workflows", get(workflows::list_workflows))
        .route("/workflows/stats", get(workflows::workflow_stats))
        .route("/workflows/:workflow_id", get(workflows::get_workflow))
        .route("/workflows/:workflow_id/activate", post(workflows::activate_workflow))
        .route("/workflows/:workflow_id/deactivate", post(workflows::deactivate_workflow))
        .route("/workflows/:workflow_id/execute", post(workflows::execute_workflow))
        .route("/config", get(config::get_config).put(config::update_config))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// CORS for the portal: the local origins plus the configured portal URL
pub fn cors_layer(portal_url: Option<&str>) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = DEFAULT_CORS_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();

    if let Some(url) = portal_url {
        match HeaderValue::from_str(url.trim_end_matches('/')) {
            Ok(origin) => origins.push(origin),
            Err(e) => tracing::warn!(portal_url = %url, error = %e, "Ignoring invalid portal URL for CORS"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

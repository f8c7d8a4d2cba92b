//! Configuration routes

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use monoliet_core::RedactedConfig;

use crate::{ApiError, AppState, PortalToken};

/// Current configuration with the API key redacted
pub async fn get_config(
    _token: PortalToken,
    State(state): State<Arc<AppState>>,
) -> Json<RedactedConfig> {
    Json(state.config.redacted())
}

/// Configuration is fixed at startup
pub async fn update_config(_token: PortalToken) -> Result<Json<RedactedConfig>, ApiError> {
    Err(ApiError::NotImplemented(
        "Configuration updates require server restart. Update the environment and restart the service.",
    ))
}

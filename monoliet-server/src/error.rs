//! Error types for the management API

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use monoliet_core::N8nError;
use serde_json::json;
use thiserror::Error;

/// Failure of a management request, rendered as `{"detail": ...}`
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bearer authentication failed
    #[error("{0}")]
    Unauthorized(&'static str),

    /// An n8n call failed while performing `action`
    #[error("{action}: {source}")]
    Remote {
        action: &'static str,
        #[source]
        source: N8nError,
    },

    #[error("{0}")]
    NotImplemented(&'static str),
}

impl ApiError {
    pub fn remote(action: &'static str, source: N8nError) -> Self {
        ApiError::Remote { action, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Remote { source, .. } => StatusCode::from_u16(source.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Remote { source, .. } => {
                tracing::error!(error = %self, code = source.error_code(), "Management request failed")
            }
            _ => tracing::warn!(error = %self, status = status.as_u16(), "Management request rejected"),
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Failure to start or run the management listener
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind management API on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Management API server error: {0}")]
    Serve(#[from] std::io::Error),
}

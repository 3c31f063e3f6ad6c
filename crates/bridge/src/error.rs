//! Unified error handling for the bridge.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::bol::{AuthError, UpstreamError};

/// Application-level error type for bridge handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Could not obtain a bol.com access token.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A Retailer API call failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// bol.com refused a shipment confirmation. The body is forwarded as-is.
    #[error("{body}")]
    Rejected { status: u16, body: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Rejected { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Bridge request error"
            );
        }

        // Don't expose upstream details to clients
        let error = match &self {
            Self::Auth(_) => "Failed to authenticate with bol.com".to_string(),
            Self::Upstream(_) => "bol.com request failed".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

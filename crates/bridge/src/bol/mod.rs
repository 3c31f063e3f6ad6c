//! bol.com Retailer API client.
//!
//! Provides the pieces every bridge operation is built from: an OAuth2
//! client-credentials token cache, a page-walking aggregator over the v9
//! listings, and pure conversions from upstream JSON to flattened records.
//!
//! # Architecture
//!
//! - Client id/secret -> bearer token (cached in memory, refreshed single-flight)
//! - Listings are walked page by page until pagination metadata, an empty page
//!   or the page ceiling says stop
//! - All HTTP goes through the [`transport::HttpTransport`] trait
//!
//! # Security
//!
//! The client secret and access tokens are held as `SecretString` and never
//! logged. Tokens are not persisted; a restart authenticates again.

pub mod auth;
pub mod client;
pub mod conversions;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use auth::{BearerToken, ClientCredentials, TokenCache};
pub use client::{Aggregated, BolClient, ItemFilter, Listing, ShipmentConfirmation};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

use thiserror::Error;

/// Default OAuth2 login host.
pub const DEFAULT_LOGIN_URL: &str = "https://login.bol.com";

/// Default Retailer API host.
pub const DEFAULT_API_URL: &str = "https://api.bol.com";

/// Media type for Retailer API v9 requests and responses.
pub const RETAILER_MEDIA_TYPE: &str = "application/vnd.retailer.v9+json";

/// Errors that can occur while obtaining an access token.
///
/// Cloneable so that one failed refresh can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token request never produced a response.
    #[error("Token request failed: {0}")]
    Transport(#[from] TransportError),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered 2xx but the body was unusable.
    #[error("Malformed token response: {0}")]
    Malformed(String),

    /// The token endpoint URL could not be built.
    #[error("Invalid token endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Errors that can occur when calling the Retailer API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Transport(#[from] TransportError),

    /// The API answered with a non-2xx status.
    #[error("Retailer API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// The request URL could not be built.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl UpstreamError {
    /// Whether upstream rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::Rejected {
            status: 401,
            body: "invalid_client".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Token endpoint returned HTTP 401: invalid_client"
        );
    }

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Retailer API returned HTTP 503: maintenance"
        );
    }

    #[test]
    fn test_unauthorized_detection() {
        let unauthorized = UpstreamError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(unauthorized.is_unauthorized());

        let transport = UpstreamError::Transport(TransportError::new("connection reset"));
        assert!(!transport.is_unauthorized());
    }
}

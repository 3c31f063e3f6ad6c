//! Integration tests for bol-bridge.
//!
//! Each test starts a [`wiremock`] server standing in for both the bol.com
//! login host and the Retailer API, points a real [`RetailerService`] (with
//! the `reqwest` transport) at it, and drives the axum router in-process.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bol-bridge-integration-tests
//! ```

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use bol_bridge::config::BolConfig;
use bol_bridge::services::RetailerService;
use bol_bridge::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client id the bridge authenticates with.
pub const CLIENT_ID: &str = "bridge-client";

/// Client secret the bridge authenticates with.
pub const CLIENT_SECRET: &str = "s3cr3t";

/// `Basic base64(CLIENT_ID:CLIENT_SECRET)`.
pub const BASIC_AUTHORIZATION: &str = "Basic YnJpZGdlLWNsaWVudDpzM2NyM3Q=";

/// Access token issued by [`TestBridge::mount_token`].
pub const ACCESS_TOKEN: &str = "integration-token";

/// Retailer API v9 media type.
pub const RETAILER_MEDIA_TYPE: &str = "application/vnd.retailer.v9+json";

/// A bridge wired to a mock bol.com.
pub struct TestBridge {
    /// Mock serving both `/token` and `/retailer/...`.
    pub upstream: MockServer,
    app: Router,
}

impl TestBridge {
    /// Start a bridge with the default page ceiling.
    pub async fn start() -> Self {
        Self::with_max_pages(100).await
    }

    /// Start a bridge that fetches at most `max_pages` pages per listing.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    pub async fn with_max_pages(max_pages: u32) -> Self {
        let upstream = MockServer::start().await;
        let base = Url::parse(&upstream.uri()).expect("mock server URI");

        let config = BolConfig {
            client_id: CLIENT_ID.to_string(),
            client_secret: SecretString::from(CLIENT_SECRET),
            login_url: base.clone(),
            api_url: base,
            max_pages,
            request_timeout: Duration::from_secs(5),
        };
        let retailer = RetailerService::from_config(&config).expect("retailer service");

        Self {
            upstream,
            app: bol_bridge::app(AppState::new(retailer)),
        }
    }

    /// Serve a valid token from `/token`, expecting exactly `times` requests.
    pub async fn mount_token(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(query_param("grant_type", "client_credentials"))
            .and(header_eq("authorization", BASIC_AUTHORIZATION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 299,
                "scope": "RETAILER"
            })))
            .expect(times)
            .mount(&self.upstream)
            .await;
    }

    /// Serve `body` for page `page` of `listing` (e.g. `/retailer/orders`).
    pub async fn mount_page(&self, listing: &str, page: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", page.to_string()))
            .and(header_eq("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
            .and(header_eq("accept", RETAILER_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    /// Send a GET request through the router.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Body::empty(), None).await
    }

    /// Send a JSON POST request through the router.
    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            uri,
            Body::from(body.to_string()),
            Some("application/json"),
        )
        .await
    }

    /// Send a request through the router.
    ///
    /// The response body is parsed as JSON, or returned as a JSON string if
    /// it is not JSON.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let request = request.body(body).expect("request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }
}

//! Token handling across concurrent requests.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use bol_bridge_integration_tests::{ACCESS_TOKEN, TestBridge};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_concurrent_requests_share_one_token_request() {
    let bridge = TestBridge::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": ACCESS_TOKEN, "expires_in": 299}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&bridge.upstream)
        .await;
    bridge
        .mount_page("/retailer/shipments", 1, json!({"shipments": []}))
        .await;

    let responses = futures::future::join_all((0..8).map(|_| bridge.get("/shipments"))).await;

    for (status, body) in responses {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn test_token_reused_across_requests() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;
    bridge
        .mount_page("/retailer/shipments", 1, json!({"shipments": []}))
        .await;

    for _ in 0..3 {
        let (status, _) = bridge.get("/shipments").await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_token_rejection_is_bad_gateway() {
    let bridge = TestBridge::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .expect(2)
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge.get("/orders").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to authenticate with bol.com");

    // Failures are not cached.
    let (status, _) = bridge.get("/shipments").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_endpoints() {
    let bridge = TestBridge::start().await;

    let (status, body) = bridge.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    // No token mock yet: the login host answers 404.
    let (status, _) = bridge.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    bridge.mount_token(1).await;
    let (status, _) = bridge.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

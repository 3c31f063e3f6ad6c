//! Order endpoints against a mocked bol.com.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Method, StatusCode};
use bol_bridge_integration_tests::{ACCESS_TOKEN, TestBridge};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn order(reference: &str, item: &str, shipment_reference: &str, status: &str) -> Value {
    json!({
        "orderId": format!("O-{reference}"),
        "reference": reference,
        "orderPlacedDateTime": "2024-03-11T13:25:42+01:00",
        "orderItems": [{"orderItemId": item, "ean": "8712626055143", "quantity": 1}],
        "customerDetails": {
            "email": "buyer@verkopen.bol.com",
            "shipmentDetails": {"reference": shipment_reference, "address": {"city": "Utrecht"}}
        },
        "fulfilment": {"status": status}
    })
}

#[tokio::test]
async fn test_orders_walks_every_page() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    let pagination = json!({"total": 3, "itemsPerPage": 2});
    bridge
        .mount_page(
            "/retailer/orders",
            1,
            json!({
                "orders": [order("R1", "1", "A", "OPEN"), order("R2", "2", "B", "OPEN")],
                "pagination": pagination
            }),
        )
        .await;
    bridge
        .mount_page(
            "/retailer/orders",
            2,
            json!({"orders": [order("R3", "3", "C", "OPEN")], "pagination": pagination}),
        )
        .await;

    let (status, body) = bridge.get("/orders").await;

    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0]["reference"], "R1");
    assert_eq!(orders[0]["orderDate"], "2024-03-11T13:25:42+01:00");
    assert_eq!(orders[0]["orderItemId"], "1");
    assert_eq!(orders[0]["address"]["city"], "Utrecht");
    assert_eq!(orders[0]["email"], "buyer@verkopen.bol.com");
    assert_eq!(orders[2]["reference"], "R3");
}

#[tokio::test]
async fn test_orders_status_filter_is_forwarded() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    Mock::given(method("GET"))
        .and(path("/retailer/orders"))
        .and(query_param("status", "OPEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(1)
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge.get("/orders?status=open").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_orders_rejects_unknown_status() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(0).await;

    let (status, body) = bridge.get("/orders?status=SHIPPED").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("SHIPPED"));
}

#[tokio::test]
async fn test_orders_upstream_failure_is_bad_gateway() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    Mock::given(method("GET"))
        .and(path("/retailer/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge.get("/orders").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "bol.com request failed");
}

#[tokio::test]
async fn test_order_id_lookup() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;
    bridge
        .mount_page(
            "/retailer/orders",
            1,
            json!({"orders": [order("R1", "111", "A", "OPEN"), order("R2", "222", "B", "OPEN")]}),
        )
        .await;
    bridge
        .mount_page("/retailer/orders", 2, json!({"orders": []}))
        .await;

    let (status, body) = bridge.get("/order-id?reference=B").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"orderItemId": "222"}));

    let (status, body) = bridge.get("/order-id?reference=C").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = bridge.get("/order-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivered_orders_keeps_shipped_only() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;
    bridge
        .mount_page(
            "/retailer/orders",
            1,
            json!({"orders": [
                order("R1", "1", "A", "SHIPPED"),
                order("R2", "2", "B", "OPEN"),
                order("R3", "3", "C", "SHIPPED")
            ]}),
        )
        .await;
    bridge
        .mount_page("/retailer/orders", 2, json!({"orders": []}))
        .await;

    let (status, body) = bridge.get("/delivered-orders").await;

    assert_eq!(status, StatusCode::OK);
    let references: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|order| order["reference"].as_str().unwrap())
        .collect();
    assert_eq!(references, vec!["R1", "R3"]);
}

#[tokio::test]
async fn test_confirm_delivery() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    Mock::given(method("POST"))
        .and(path("/retailer/orders/1043946570/shipment"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "shipmentReference": "DELIVERY-1043946570",
            "transport": {"transporterCode": "DHL", "trackAndTrace": "3SAOLD1234567"},
            "shippingLabelId": null
        })))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"processStatusId": "1", "status": "PENDING"})),
        )
        .expect(1)
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge
        .post_json(
            "/confirm-delivery",
            &json!({"orderId": "1043946570", "transporterCode": "DHL", "trackAndTrace": "3SAOLD1234567"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "delivered");
    assert_eq!(body["bol"]["status"], "PENDING");
}

#[tokio::test]
async fn test_confirm_delivery_accepts_numeric_order_id() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    Mock::given(method("POST"))
        .and(path("/retailer/orders/1043946570/shipment"))
        .and(body_json(json!({
            "shipmentReference": "DELIVERY-1043946570",
            "transport": {"transporterCode": "TNT", "trackAndTrace": "1234567890"},
            "shippingLabelId": null
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "PENDING"})))
        .expect(1)
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge
        .post_json("/confirm-delivery", &json!({"orderId": 1_043_946_570}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "delivered");
}

#[tokio::test]
async fn test_confirm_delivery_forwards_rejection() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(1).await;

    let rejection = r#"{"type":"https://api.bol.com/problems","title":"Error validating request","status":400}"#;
    Mock::given(method("POST"))
        .and(path("/retailer/orders/42/shipment"))
        .respond_with(ResponseTemplate::new(400).set_body_string(rejection))
        .mount(&bridge.upstream)
        .await;

    let (status, body) = bridge
        .post_json("/confirm-delivery", &json!({"orderId": "42"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], rejection);
}

#[tokio::test]
async fn test_confirm_delivery_validates_body() {
    let bridge = TestBridge::start().await;
    bridge.mount_token(0).await;

    let (status, body) = bridge.post_json("/confirm-delivery", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad request: Missing orderId");

    let (status, _) = bridge
        .send(
            Method::POST,
            "/confirm-delivery",
            Body::from("not json"),
            Some("application/json"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

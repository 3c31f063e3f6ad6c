//! HTTP route handlers for the bridge.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (can we obtain a token?)
//!
//! # Orders
//! GET  /orders?status=ALL|OPEN - Flattened order listing
//! GET  /order-id?reference=    - First order item id for a shipment reference
//! POST /confirm-delivery       - Register a delivery shipment for an order
//! GET  /delivered-orders       - Orders whose fulfilment status is SHIPPED
//!
//! # Shipments
//! GET  /shipments              - Flattened shipment listing
//! ```

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod orders;
pub mod shipments;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(shipments::router())
}

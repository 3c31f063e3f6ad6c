//! Order handlers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use bol_bridge_core::{OrderRecord, OrderStatus};
use serde::Deserialize;

use crate::{
    error::AppError,
    services::{ConfirmDelivery, DeliveryReceipt, OrderItemLookup},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/order-id", get(resolve_order_id))
        .route("/confirm-delivery", post(confirm_delivery))
        .route("/delivered-orders", get(list_delivered_orders))
}

/// Query for the order listing.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Query for the order-id lookup.
#[derive(Debug, Deserialize)]
pub struct OrderIdQuery {
    pub reference: Option<String>,
}

/// List orders, optionally filtered by status (default `ALL`).
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status, or an upstream error.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .unwrap_or_default();

    Ok(Json(state.retailer().list_orders(status).await?))
}

/// Look up the order item id for a shipment reference.
///
/// # Errors
///
/// Returns `AppError::BadRequest` without `reference`, `AppError::NotFound`
/// when no order matches, or an upstream error.
pub async fn resolve_order_id(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> Result<Json<OrderItemLookup>, AppError> {
    let lookup = state
        .retailer()
        .resolve_order_item_id(query.reference.as_deref())
        .await?;
    Ok(Json(lookup))
}

/// Confirm delivery of an order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unreadable body or missing
/// `orderId`, and `AppError::Rejected` if bol.com refuses the shipment.
pub async fn confirm_delivery(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmDelivery>, JsonRejection>,
) -> Result<Json<DeliveryReceipt>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(Json(state.retailer().confirm_delivery(request).await?))
}

/// List orders that bol.com reports as shipped.
///
/// # Errors
///
/// Returns `AppError` if bol.com cannot be reached or authenticated against.
pub async fn list_delivered_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    Ok(Json(state.retailer().list_delivered_orders().await?))
}

//! Shipment handlers.

use axum::{Json, Router, extract::State, routing::get};
use bol_bridge_core::ShipmentRecord;

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/shipments", get(list_shipments))
}

/// List every shipment.
///
/// # Errors
///
/// Returns `AppError` if bol.com cannot be reached or authenticated against.
pub async fn list_shipments(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShipmentRecord>>, AppError> {
    Ok(Json(state.retailer().list_shipments().await?))
}

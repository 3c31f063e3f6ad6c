//! Flattened records returned by the bridge.
//!
//! Every field is optional: an upstream order or shipment that lacks a value
//! still produces a record, with the missing field left out of the JSON.

use serde::{Deserialize, Serialize};

use super::id::{OrderItemId, ShipmentId};

/// A simplified bol.com order, built from the first order item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Order reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// When the order was placed, as reported upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    /// ID of the first order item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<OrderItemId>,
    /// EAN of the first order item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    /// Quantity of the first order item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// Shipment address, passed through as upstream delivered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<serde_json::Value>,
    /// Customer e-mail address (usually a bol.com relay address).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A simplified bol.com shipment, built from the first shipped item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<ShipmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<OrderItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    /// Carrier code, e.g. `TNT` or `DHL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_and_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_reference: Option<String>,
}

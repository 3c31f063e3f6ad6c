//! Conversions from Retailer API JSON to bridge records.
//!
//! Upstream items are decoded field by field: a missing value, or one of an
//! unexpected JSON type, leaves that field empty and never fails the record.

use bol_bridge_core::{OrderItemId, OrderRecord, ShipmentId, ShipmentRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// =============================================================================
// Raw upstream shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOrder {
    #[serde(deserialize_with = "lenient_text")]
    reference: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    order_placed_date_time: Option<String>,
    #[serde(deserialize_with = "first_element")]
    order_items: Option<RawOrderItem>,
    #[serde(deserialize_with = "lenient")]
    customer_details: Option<RawCustomerDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOrderItem {
    #[serde(deserialize_with = "lenient_text")]
    order_item_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    ean: Option<String>,
    #[serde(deserialize_with = "lenient_integer")]
    quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCustomerDetails {
    #[serde(deserialize_with = "lenient_text")]
    email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    shipment_details: Option<RawShipmentDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawShipmentDetails {
    #[serde(deserialize_with = "lenient_text")]
    reference: Option<String>,
    #[serde(deserialize_with = "present")]
    address: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawShipment {
    #[serde(deserialize_with = "lenient_text")]
    shipment_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    shipment_date_time: Option<String>,
    #[serde(deserialize_with = "first_element")]
    order_items: Option<RawOrderItem>,
    #[serde(deserialize_with = "lenient")]
    transport: Option<RawTransport>,
    #[serde(deserialize_with = "lenient_text")]
    shipment_reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTransport {
    #[serde(deserialize_with = "lenient_text")]
    transporter_code: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    track_and_trace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFulfilment {
    #[serde(deserialize_with = "lenient_text")]
    status: Option<String>,
}

// =============================================================================
// Lenient field decoders
// =============================================================================

/// Strings as-is, numbers as their decimal text, anything else absent.
pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

/// Any value except `null`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Ok(Some(Value::deserialize(deserializer)?).filter(|value| !value.is_null()))
}

/// A nested object, or absent if it does not decode.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// The first element of an array, or absent.
fn first_element<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .next()
            .and_then(|first| serde_json::from_value(first).ok()),
        _ => None,
    })
}

/// Decode a raw item; a non-object item decodes to all-absent.
fn decode<T: DeserializeOwned + Default>(raw: Value) -> T {
    serde_json::from_value(raw).unwrap_or_default()
}

// =============================================================================
// Public conversions
// =============================================================================

/// Flatten an upstream order into an [`OrderRecord`] built from its first item.
#[must_use]
pub fn order_to_record(raw: Value) -> OrderRecord {
    let order: RawOrder = decode(raw);
    let item = order.order_items.unwrap_or_default();
    let customer = order.customer_details.unwrap_or_default();

    OrderRecord {
        reference: order.reference,
        order_date: order.order_placed_date_time,
        order_item_id: item.order_item_id.map(OrderItemId::new),
        ean: item.ean,
        quantity: item.quantity,
        address: customer.shipment_details.and_then(|details| details.address),
        email: customer.email,
    }
}

/// Flatten an upstream shipment into a [`ShipmentRecord`].
#[must_use]
pub fn shipment_to_record(raw: Value) -> ShipmentRecord {
    let shipment: RawShipment = decode(raw);
    let item = shipment.order_items.unwrap_or_default();
    let transport = shipment.transport.unwrap_or_default();

    ShipmentRecord {
        shipment_id: shipment.shipment_id.map(ShipmentId::new),
        shipment_date_time: shipment.shipment_date_time,
        order_item_id: item.order_item_id.map(OrderItemId::new),
        ean: item.ean,
        transporter_code: transport.transporter_code,
        track_and_trace: transport.track_and_trace,
        shipment_reference: shipment.shipment_reference,
    }
}

/// `customerDetails.shipmentDetails.reference` of an upstream order.
#[must_use]
pub fn shipment_reference(raw: &Value) -> Option<String> {
    let details: RawShipmentDetails = decode(
        raw.get("customerDetails")?
            .get("shipmentDetails")?
            .clone(),
    );
    details.reference
}

/// Whether an upstream order's `fulfilment.status` is `SHIPPED`.
#[must_use]
pub fn is_shipped(raw: &Value) -> bool {
    raw.get("fulfilment")
        .cloned()
        .map(decode::<RawFulfilment>)
        .and_then(|fulfilment| fulfilment.status)
        .is_some_and(|status| status == "SHIPPED")
}

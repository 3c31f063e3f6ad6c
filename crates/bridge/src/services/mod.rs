//! Business logic services for the bridge.
//!
//! # Services
//!
//! - `retailer` - Order and shipment operations over the bol.com Retailer API

pub mod retailer;

pub use retailer::{
    ConfirmDelivery, DeliveryReceipt, OrderItemLookup, RetailerService, DEFAULT_TRACK_AND_TRACE,
    DEFAULT_TRANSPORTER_CODE,
};

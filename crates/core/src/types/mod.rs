//! Core types for the bridge.
//!
//! This module provides type-safe wrappers for upstream identifiers and the
//! simplified records returned to callers.

pub mod id;
pub mod record;
pub mod status;

pub use id::*;
pub use record::{OrderRecord, ShipmentRecord};
pub use status::*;

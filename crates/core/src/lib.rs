//! bol-bridge core - shared record types.
//!
//! This crate provides the types exchanged between the bridge service and
//! its callers:
//! - `bridge` - the HTTP service translating simplified calls into bol.com
//!   Retailer API requests
//! - `integration-tests` - end-to-end tests against mocked upstreams
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Mapping from
//! upstream JSON lives next to the client in the bridge crate.
//!
//! # Modules
//!
//! - [`types`] - Identifier newtypes, the order status filter, and the
//!   flattened order/shipment records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

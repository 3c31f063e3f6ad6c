//! bol-bridge library.
//!
//! A small HTTP service that authenticates against the bol.com Retailer API
//! once, caches the bearer token, and exposes simplified order and shipment
//! operations as JSON endpoints.
//!
//! The crate is a library so the router can be driven in tests; the
//! `bol-bridge` binary adds configuration, tracing and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bol;
pub mod clock;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Build the application router with its state attached.
pub fn app(state: AppState) -> Router {
    routes::routes().with_state(state)
}

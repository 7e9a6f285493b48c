//! # SPG server
//! This module hosts the server code for the SMM panel gateway. It is responsible for:
//! * Serving the storefront API: the normalized service catalog and the order endpoints.
//! * Adapting the `panel_tools` HTTP clients to the engine's provider and rate-source traits.
//! * Running the background workers: the order reconciliation ticker and the FX refresh ticker.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/services`: The normalized service catalog.
//! * `/api/orders`: Order placement (POST) and order history (GET).
//! * `/api/orders/{id}/cancel`: Cancels an order that never reached the panel.
//! * `/api/orders/{id}/refund`: Operator-driven refund of part or all of an order.
//!
//! Authentication happens upstream: a fronting proxy injects the caller's id in the `SPG-User-Id` header,
//! and requests without it are rejected with 401.

pub mod config;
pub mod data_objects;
#[cfg(test)]
mod endpoint_tests;
pub mod errors;
pub mod fx_worker;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod sync_worker;

//! # SMM panel engine public API
//!
//! The `spe_api` module exposes the programmatic API for the panel engine. The API is modular, so that
//! clients can pick and choose the functionality they want, and each piece can be driven by a different
//! backend if needed.
//!
//! * [`catalog_api`] owns the normalized service catalog: provider fetch, override merge, classification and
//!   the read cache in front of it all.
//! * [`order_flow_api`] is the primary API for placing orders: pricing, the debit-then-submit flow with
//!   compensation, user cancels and operator refunds.
//! * [`sync_api`] reconciles submitted orders against the panel's own status reports and pays out
//!   proportional refunds.
//! * [`fx_api`] caches the USD exchange rate used for pricing and catalog normalization.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying backends that
//! implement the traits the API requires.
//!
//! ```rust,ignore
//! use smm_panel_engine::{CatalogApi, FxRateApi, PgDatabase};
//! let db = PgDatabase::new_with_url(...).await?;
//! let fx = FxRateApi::new(rate_source, "INR", 83.0);
//! // PgDatabase implements CatalogStore
//! let api = CatalogApi::new(db, panel_client, fx, settings);
//! let services = api.fetch_services().await?;
//! ```

pub mod catalog_api;
pub mod errors;
pub mod fx_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod sync_api;

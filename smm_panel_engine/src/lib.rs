//! SMM Panel Engine
//!
//! The engine contains the order lifecycle and catalog reconciliation logic for the SMM panel gateway: it
//! resells a third-party engagement panel under a markup while keeping a local wallet ledger consistent with
//! the panel's asynchronous, unreliable order handling.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@postgres`]). Postgres is the supported backend. You should never need to access the
//!    database directly; use the public API instead. The exception is the data types used by the database,
//!    which are defined in [`db_types`] and are public.
//! 2. The engine public API ([`mod@spe_api`]): the catalog cache, the order placement coordinator, the
//!    background reconciler and the FX rate cache. Each API is generic over the traits in [`traits`], so any
//!    backend (or test fake) that implements them can drive the engine.
//! 3. The side-job queue ([`jobs`]): bounded fire-and-forget work (purchase counters, provider-side cancels)
//!    that must never block or fail a user request.
mod catalog;
#[cfg(feature = "postgres")]
mod postgres;

pub mod db_types;
pub mod jobs;
pub mod spe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use catalog::{
    classify_platform,
    classify_type,
    classify_variant,
    normalize_service,
    normalize_services,
    CatalogSettings,
    NormalizedService,
    Platform,
    ServiceType,
};
#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
pub use spe_api::{
    catalog_api::{CatalogApi, CATALOG_TTL},
    errors::{CatalogApiError, OrderFlowError, SyncApiError},
    fx_api::{FxRateApi, FX_TTL},
    order_flow_api::OrderFlowApi,
    order_objects,
    sync_api::{OrderSyncApi, SyncReport, SYNC_BATCH_SIZE, SYNC_LOOKBACK_DAYS},
};

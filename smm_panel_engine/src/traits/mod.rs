//! Interface contracts between the engine and the outside world.
//!
//! The engine never talks HTTP or SQL directly. Everything it needs from its collaborators is expressed as a
//! trait in this module, so that the core components can be driven by fakes in tests and by the real Postgres
//! pool and panel client in the server binary:
//!
//! * [`PanelProvider`] — the upstream SMM panel: catalog fetch, order submission, status polling, cancels.
//! * [`RateSource`] — the external USD exchange-rate quote.
//! * [`CatalogStore`] — persisted service overrides and the purchase counter.
//! * [`LedgerDatabase`] — wallets, orders and the append-only transaction ledger. Every method that moves
//!   money is a single atomic transaction on the backend.
mod catalog_store;
mod data_objects;
mod ledger_database;
mod panel_provider;
mod rate_source;

pub use catalog_store::{CatalogStore, CatalogStoreError};
pub use data_objects::{CanceledOrder, ManualRefund, RemoteStatusUpdate, SubmissionOutcome, SyncOutcome};
pub use ledger_database::{LedgerDatabase, LedgerDbError};
pub use panel_provider::{PanelOrderRequest, PanelProvider, PanelService, PanelSubmission, ProviderError, RemoteOrderStatus};
pub use rate_source::{RateSource, RateSourceError};

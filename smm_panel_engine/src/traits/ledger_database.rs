use chrono::Duration;
use spg_common::Cents;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, UserWallet},
    order_objects::{OrderQueryFilter, OrderSummary},
    traits::data_objects::{CanceledOrder, ManualRefund, RemoteStatusUpdate, SubmissionOutcome, SyncOutcome},
};

/// Storage for wallets, orders and the transaction ledger.
///
/// Every method that moves money is one atomic transaction: the wallet mutation, its ledger row and the order
/// change all commit together or not at all. Rows that are about to be mutated are read under
/// `SELECT … FOR UPDATE` (or the backend's equivalent), so a user cancel and a reconciler refund can never
/// both pay out for the same order.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fetches a user's wallet. A user without a wallet row has an empty wallet, not an error.
    async fn fetch_wallet(&self, user_id: i64) -> Result<UserWallet, LedgerDbError>;

    /// Atomically debits the wallet and inserts the order as `pending`, together with a `debit` ledger row.
    ///
    /// The balance is checked under a row lock inside the same transaction; an insufficient balance (a missing
    /// wallet row counts as zero) returns [`LedgerDbError::InsufficientFunds`] and writes nothing.
    async fn debit_and_create_order(&self, order: NewOrder) -> Result<Order, LedgerDbError>;

    /// Records a successful panel hand-off: stores the panel's order id and raw response and moves the order
    /// to `submitted`. The update only applies while the row is still `pending`; when a concurrent cancel won
    /// the race during the panel call, the row is left alone and comes back as
    /// [`SubmissionOutcome::Superseded`].
    async fn mark_order_submitted(
        &self,
        order_id: i64,
        provider_order_id: Option<&str>,
        raw_response: &str,
    ) -> Result<SubmissionOutcome, LedgerDbError>;

    /// Reverses a failed hand-off: credits the full charge back, writes a `credit` ledger row, marks the order
    /// `failed` and records the panel's error text. The compensation only runs if the order is still
    /// `pending`; a concurrent cancel that already paid out leaves the order untouched.
    async fn compensate_failed_order(&self, order_id: i64, reason: &str) -> Result<Order, LedgerDbError>;

    /// A user's orders, newest first, joined with override display metadata.
    async fn fetch_orders_for_user(
        &self,
        user_id: i64,
        filter: OrderQueryFilter,
    ) -> Result<Vec<OrderSummary>, LedgerDbError>;

    /// Orders the reconciler should poll the panel about: non-terminal or recently finalized, with a non-empty
    /// panel order id, created within `lookback`, capped at `limit` rows.
    async fn fetch_sync_candidates(&self, lookback: Duration, limit: i64) -> Result<Vec<Order>, LedgerDbError>;

    /// Applies one panel status report to one order, re-reading the row under a lock. Terminal orders are
    /// skipped; a `canceled` or `partial` report pays out exactly the delta between the cumulative refund and
    /// the newly computed target, never more.
    async fn apply_remote_status(&self, update: RemoteStatusUpdate) -> Result<SyncOutcome, LedgerDbError>;

    /// Cancels a user's own order before it reached the panel, crediting the unrefunded remainder back in the
    /// same transaction. Rejects finalized orders and orders that hold a panel order id.
    async fn cancel_unsubmitted_order(&self, user_id: i64, order_id: i64) -> Result<CanceledOrder, LedgerDbError>;

    /// Operator-driven refund. Caps `requested` at the unrefunded remainder (a missing amount refunds all of
    /// it), credits the wallet, and marks the order `refunded` only once fully paid out.
    async fn manual_refund(&self, order_id: i64, requested: Option<Cents>) -> Result<ManualRefund, LedgerDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order (id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("Order #{0} is already finalized")]
    OrderFinalized(i64),
    #[error("Order #{0} has already been sent to the panel")]
    OrderAlreadySubmitted(i64),
    #[error("Order #{0} has no refundable balance left")]
    NothingToRefund(i64),
    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientFunds { required: Cents, available: Cents },
}

impl From<sqlx::Error> for LedgerDbError {
    fn from(e: sqlx::Error) -> Self {
        LedgerDbError::DatabaseError(e.to_string())
    }
}

//! `PostgresDatabase` is the concrete storage backend for the SMM panel engine.
//!
//! It implements the [`LedgerDatabase`] and [`CatalogStore`] traits over a sqlx Postgres pool. Every
//! money-moving method is one transaction built from the low-level functions in [`super::db`]: the wallet
//! mutation, its ledger row and the order change commit together or roll back together, and rows about to be
//! mutated are read with `SELECT … FOR UPDATE` first.
use std::{collections::HashMap, fmt::Debug};

use chrono::Duration;
use log::*;
use spg_common::Cents;
use sqlx::PgPool;

use super::db::{db_url, ledger, new_pool, orders, service_overrides, wallets};
use crate::{
    db_types::{NewLedgerEntry, NewOrder, Order, OrderStatusType, ServiceOverride, UserWallet},
    order_objects::{OrderQueryFilter, OrderSummary},
    spe_api::sync_api::{refund_delta, refund_target},
    traits::{
        CanceledOrder,
        CatalogStore,
        CatalogStoreError,
        LedgerDatabase,
        LedgerDbError,
        ManualRefund,
        RemoteStatusUpdate,
        SubmissionOutcome,
        SyncOutcome,
    },
};

#[derive(Clone)]
pub struct PostgresDatabase {
    url: String,
    pool: PgPool,
}

impl Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PostgresDatabase ({:?})", self.pool)
    }
}

impl PostgresDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl LedgerDatabase for PostgresDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_wallet(&self, user_id: i64) -> Result<UserWallet, LedgerDbError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet(user_id, &mut conn).await?;
        Ok(wallet.unwrap_or_else(|| UserWallet::empty(user_id)))
    }

    async fn debit_and_create_order(&self, order: NewOrder) -> Result<Order, LedgerDbError> {
        let mut tx = self.pool.begin().await?;
        let available = wallets::fetch_wallet_for_update(order.user_id, &mut tx)
            .await?
            .map(|w| w.balance)
            .unwrap_or_default();
        if available < order.amount_cents {
            return Err(LedgerDbError::InsufficientFunds { required: order.amount_cents, available });
        }
        wallets::debit(order.user_id, order.amount_cents, &mut tx).await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let entry = NewLedgerEntry::debit(
            order.user_id,
            order.amount_cents,
            format!("Charge for order #{} ({} × {})", order.id, order.quantity, order.service_id),
        );
        ledger::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} saved. {} reserved from user {}", order.id, order.amount_cents, order.user_id);
        Ok(order)
    }

    async fn mark_order_submitted(
        &self,
        order_id: i64,
        provider_order_id: Option<&str>,
        raw_response: &str,
    ) -> Result<SubmissionOutcome, LedgerDbError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(order) = orders::mark_submitted(order_id, provider_order_id, raw_response, &mut conn).await? {
            return Ok(SubmissionOutcome::Recorded(order));
        }
        // The guarded update missed: the row is gone, or it left `pending` during the panel call.
        let order =
            orders::fetch_order(order_id, &mut conn).await?.ok_or(LedgerDbError::OrderNotFound(order_id))?;
        warn!("🗃️ Order #{order_id} was finalized as {} during the panel hand-off. Leaving it alone.", order.status);
        Ok(SubmissionOutcome::Superseded(order))
    }

    async fn compensate_failed_order(&self, order_id: i64, reason: &str) -> Result<Order, LedgerDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_for_update(order_id, &mut tx).await?.ok_or(LedgerDbError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            debug!("🗃️ Order #{order_id} is {} and no longer compensatable. Leaving it alone.", order.status);
            return Ok(order);
        }
        let refund = order.refundable();
        if refund.is_positive() {
            wallets::upsert_credit(order.user_id, refund, &mut tx).await?;
            let entry = NewLedgerEntry::credit(
                order.user_id,
                refund,
                format!("Reversal of failed order #{order_id}: {reason}"),
            );
            ledger::insert_entry(entry, &mut tx).await?;
        }
        let order = orders::record_failure(order_id, reason, refund, &mut tx)
            .await?
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} compensated. {refund} returned to user {}", order.user_id);
        Ok(order)
    }

    async fn fetch_orders_for_user(
        &self,
        user_id: i64,
        filter: OrderQueryFilter,
    ) -> Result<Vec<OrderSummary>, LedgerDbError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders_for_user(user_id, filter, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_sync_candidates(&self, lookback: Duration, limit: i64) -> Result<Vec<Order>, LedgerDbError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_sync_candidates(lookback, limit, &mut conn).await?;
        Ok(orders)
    }

    async fn apply_remote_status(&self, update: RemoteStatusUpdate) -> Result<SyncOutcome, LedgerDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_for_update(update.order_id, &mut tx)
            .await?
            .ok_or(LedgerDbError::OrderNotFound(update.order_id))?;
        if order.status.is_terminal_for_sync() {
            return Ok(SyncOutcome::SkippedTerminal);
        }
        let old_status = order.status;
        let target =
            refund_target(update.status, order.amount_cents, order.refunded_cents, update.remains, order.quantity);
        let refund = refund_delta(target, order.amount_cents, order.refunded_cents);
        if refund.is_positive() {
            wallets::upsert_credit(order.user_id, refund, &mut tx).await?;
            let entry = NewLedgerEntry::credit(
                order.user_id,
                refund,
                format!("Auto-refund for provider status '{}' order #{}", update.status, order.id),
            );
            ledger::insert_entry(entry, &mut tx).await?;
        }
        orders::apply_remote_report(order.id, update.status, update.remains, update.start_count, refund, &mut tx)
            .await?
            .ok_or(LedgerDbError::OrderNotFound(order.id))?;
        tx.commit().await?;
        let outcome = if refund.is_positive() {
            SyncOutcome::Refunded { old_status, new_status: update.status, amount: refund }
        } else {
            SyncOutcome::Updated { old_status, new_status: update.status }
        };
        Ok(outcome)
    }

    async fn cancel_unsubmitted_order(&self, user_id: i64, order_id: i64) -> Result<CanceledOrder, LedgerDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_for_update(order_id, &mut tx)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        if !order.status.is_in_flight() {
            return Err(LedgerDbError::OrderFinalized(order_id));
        }
        if order.provider_order_id.as_deref().map(|id| !id.is_empty()).unwrap_or(false) {
            return Err(LedgerDbError::OrderAlreadySubmitted(order_id));
        }
        let refund = order.refundable();
        let mut new_balance = Cents::default();
        if refund.is_positive() {
            let wallet = wallets::upsert_credit(user_id, refund, &mut tx).await?;
            new_balance = wallet.balance;
            let entry = NewLedgerEntry::credit(user_id, refund, format!("Cancellation of order #{order_id}"));
            ledger::insert_entry(entry, &mut tx).await?;
        }
        orders::apply_refund(order_id, refund, OrderStatusType::Canceled, &mut tx)
            .await?
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} canceled before submission. {refund} returned to user {user_id}");
        Ok(CanceledOrder { order_id, refunded: refund, new_balance })
    }

    async fn manual_refund(&self, order_id: i64, requested: Option<Cents>) -> Result<ManualRefund, LedgerDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_for_update(order_id, &mut tx).await?.ok_or(LedgerDbError::OrderNotFound(order_id))?;
        let remaining = order.refundable();
        if !remaining.is_positive() {
            return Err(LedgerDbError::NothingToRefund(order_id));
        }
        let refund = requested.filter(|r| r.is_positive()).unwrap_or(remaining).min(remaining);
        wallets::upsert_credit(order.user_id, refund, &mut tx).await?;
        let entry = NewLedgerEntry::credit(order.user_id, refund, format!("Manual refund for order #{order_id}"));
        ledger::insert_entry(entry, &mut tx).await?;
        let total_refunded = order.refunded_cents + refund;
        let new_status =
            if total_refunded == order.amount_cents { OrderStatusType::Refunded } else { order.status };
        let order = orders::apply_refund(order_id, refund, new_status, &mut tx)
            .await?
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} manually refunded {refund}. {total_refunded} refunded in total");
        Ok(ManualRefund {
            order_id,
            user_id: order.user_id,
            refunded: refund,
            total_refunded,
            new_status,
            provider_order_id: order.provider_order_id,
        })
    }

    async fn close(&mut self) -> Result<(), LedgerDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogStore for PostgresDatabase {
    async fn fetch_service_overrides(&self) -> Result<HashMap<String, ServiceOverride>, CatalogStoreError> {
        let mut conn = self.pool.acquire().await?;
        let overrides = service_overrides::fetch_all(&mut conn).await?;
        Ok(overrides)
    }

    async fn record_purchase(&self, source_service_id: &str) -> Result<(), CatalogStoreError> {
        let mut conn = self.pool.acquire().await?;
        service_overrides::record_purchase(source_service_id, &mut conn).await?;
        Ok(())
    }
}

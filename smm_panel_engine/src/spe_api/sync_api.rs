//! The background reconciler.
//!
//! Submitted orders drift: the panel completes, cancels or partially delivers them on its own schedule. One
//! reconciliation cycle polls the panel for every candidate order in a single batch call and folds the
//! reports back into the ledger, paying out refunds where delivery fell short.
//!
//! Refunds are computed as a *delta against the cumulative refund* already on the order. The panel may
//! report `partial` with a shrinking `remains`, an operator may have refunded part of the charge by hand,
//! and a cancel may arrive after all of that; whatever the history, one more report only ever tops the
//! payout up to the newest target and never past the original charge.

use std::fmt::Debug;

use chrono::Duration;
use log::*;
use spg_common::Cents;

use crate::{
    db_types::OrderStatusType,
    spe_api::errors::SyncApiError,
    traits::{LedgerDatabase, PanelProvider, RemoteStatusUpdate, SyncOutcome},
};

/// How far back the candidate query looks. Older orders are left alone even if still open.
pub const SYNC_LOOKBACK_DAYS: i64 = 7;
/// Candidate cap per cycle, which is also the panel's batch-status limit.
pub const SYNC_BATCH_SIZE: i64 = 100;

/// The refund the order *should* have accumulated given a freshly reported status.
///
/// A panel-side cancel targets the full charge. A partial delivery targets the undelivered fraction,
/// `amount × remains / quantity` in integer math. Every other status leaves the cumulative refund where it
/// is; in particular `failed` moves no money here, since submission failures are compensated at placement
/// time.
pub fn refund_target(status: OrderStatusType, amount_cents: Cents, refunded_cents: Cents, remains: i64, quantity: i64) -> Cents {
    match status {
        OrderStatusType::Canceled => amount_cents,
        OrderStatusType::Partial if quantity > 0 && remains > 0 => {
            Cents::from(amount_cents.value() * remains / quantity)
        },
        _ => refunded_cents,
    }
}

/// The amount to actually pay out now: the gap between the target and what has already been refunded,
/// clamped to `[0, amount − refunded]`. A target the history already covers pays nothing; a bogus target
/// can never push the cumulative refund past the charge.
pub fn refund_delta(target: Cents, amount_cents: Cents, refunded_cents: Cents) -> Cents {
    let remaining = amount_cents - refunded_cents;
    let delta = target - refunded_cents;
    delta.max(Cents::from(0)).min(remaining.max(Cents::from(0)))
}

/// Counters for one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Candidates selected from the ledger.
    pub scanned: usize,
    /// Orders whose status or counters changed.
    pub updated: usize,
    /// Orders that received a refund this cycle.
    pub refunded: usize,
    /// Total paid out this cycle.
    pub refunded_total: Cents,
    /// Orders found terminal under the row lock and left alone.
    pub skipped: usize,
    /// Orders whose update failed; they stay candidates for the next cycle.
    pub failed: usize,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} scanned, {} updated, {} refunded ({}), {} skipped, {} failed",
            self.scanned, self.updated, self.refunded, self.refunded_total, self.skipped, self.failed
        )
    }
}

pub struct OrderSyncApi<B, P> {
    db: B,
    provider: P,
}

impl<B, P> Debug for OrderSyncApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderSyncApi")
    }
}

impl<B, P> OrderSyncApi<B, P>
where
    B: LedgerDatabase,
    P: PanelProvider,
{
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }

    /// Runs one reconciliation pass. A panel transport failure aborts the whole cycle (the next tick
    /// retries); a failure on a single order is counted and skipped.
    pub async fn sync_cycle(&self) -> Result<SyncReport, SyncApiError> {
        let candidates = self.db.fetch_sync_candidates(Duration::days(SYNC_LOOKBACK_DAYS), SYNC_BATCH_SIZE).await?;
        if candidates.is_empty() {
            debug!("🔁️ No orders to reconcile");
            return Ok(SyncReport::default());
        }
        let ids = candidates
            .iter()
            .filter_map(|o| o.provider_order_id.clone())
            .filter(|id| !id.is_empty())
            .collect::<Vec<String>>();
        info!("🔁️ Reconciling {} orders against the panel", ids.len());
        let statuses = self.provider.fetch_statuses(&ids).await?;
        trace!("🔁️ Panel reported on {} of {} orders", statuses.len(), ids.len());

        let mut report = SyncReport { scanned: candidates.len(), ..SyncReport::default() };
        for order in &candidates {
            let Some(provider_order_id) = order.provider_order_id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            // Orders the panel does not know, or reported garbage for, are left for the next cycle.
            let Some(remote) = statuses.get(provider_order_id) else { continue };
            let Some(raw_status) = remote.status.as_deref() else { continue };
            let update = RemoteStatusUpdate {
                order_id: order.id,
                status: OrderStatusType::from_provider(raw_status),
                remains: remote.remains,
                start_count: remote.start_count,
            };
            match self.db.apply_remote_status(update).await {
                Ok(SyncOutcome::SkippedTerminal) => report.skipped += 1,
                Ok(SyncOutcome::Updated { old_status, new_status }) => {
                    report.updated += 1;
                    trace!("🔁️ Order #{} moved {old_status} → {new_status}", order.id);
                },
                Ok(SyncOutcome::Refunded { old_status, new_status, amount }) => {
                    report.updated += 1;
                    report.refunded += 1;
                    report.refunded_total += amount;
                    debug!("🔁️ Order #{} moved {old_status} → {new_status} and returned {amount}", order.id);
                },
                Err(e) => {
                    report.failed += 1;
                    warn!("🔁️ Panel report for Order #{} was not applied: {e}", order.id);
                },
            }
        }
        info!("🔁️ Reconciliation pass complete. {report}");
        Ok(report)
    }
}

//--------------------------------------    Refund math tests     -----------------------------------------------------

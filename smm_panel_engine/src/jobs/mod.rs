//! Fire-and-forget side work.
//!
//! Purchase-count bumps and upstream cancels must never block or fail a user request, so they are pushed
//! onto a bounded queue and drained by a small pool of worker tasks. A full queue drops the job with a
//! warning instead of applying backpressure; a failed job is logged and never retried.

mod channel;
mod job_types;

pub use channel::{side_job_channel, SideJobQueue, SideJobSender};
pub use job_types::SideJob;
use log::*;

use crate::traits::{CatalogStore, PanelProvider};

/// Queue capacity before dispatches start getting dropped.
pub const SIDE_JOB_BUFFER: usize = 64;
/// How many workers the server spawns to drain the queue.
pub const SIDE_JOB_WORKERS: usize = 4;

/// Drains the queue until every sender is gone. The server spawns [`SIDE_JOB_WORKERS`] of these; jobs are
/// picked up one at a time but processed concurrently across the pool.
pub async fn run_side_job_worker<B, P>(queue: SideJobQueue, db: B, provider: P)
where
    B: CatalogStore,
    P: PanelProvider,
{
    debug!("📬️ Side-job worker started");
    while let Some(job) = queue.next_job().await {
        handle_job(job, &db, &provider).await;
    }
    debug!("📬️ Side-job worker stopped");
}

async fn handle_job<B, P>(job: SideJob, db: &B, provider: &P)
where
    B: CatalogStore,
    P: PanelProvider,
{
    match job {
        SideJob::RecordPurchase { source_service_id } => {
            trace!("📬️ Recording a purchase of service {source_service_id}");
            if let Err(e) = db.record_purchase(&source_service_id).await {
                warn!("📬️ Purchase count for service {source_service_id} was not recorded: {e}");
            }
        },
        SideJob::CancelRemote { order_id, provider_order_id } => {
            debug!("📬️ Asking the panel to cancel [{provider_order_id}] (local Order #{order_id})");
            match provider.cancel_order(&provider_order_id).await {
                Ok(ack) => debug!("📬️ Panel cancel acknowledgement for [{provider_order_id}]: {ack}"),
                Err(e) => warn!("📬️ Panel cancel for [{provider_order_id}] failed: {e}"),
            }
        },
    }
}

use log::*;
use smm_panel_engine::{OrderSyncApi, PostgresDatabase};
use tokio::{sync::watch, task::JoinHandle};

use crate::integrations::PanelClient;

/// How often the reconciler polls the panel.
pub const SYNC_INTERVAL: std::time::Duration = std::time::Duration::from_secs(120);

/// Starts the order reconciliation worker. The first cycle runs immediately so a restart picks up drift
/// without waiting out an interval; the worker stops between cycles when the shutdown channel closes.
pub fn start_sync_worker(
    db: PostgresDatabase,
    provider: PanelClient,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = OrderSyncApi::new(db, provider);
        let mut timer = tokio::time::interval(SYNC_INTERVAL);
        info!("🔁️ Order sync worker started");
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    match api.sync_cycle().await {
                        Ok(report) => debug!("🔁️ Reconciliation cycle done. {report}"),
                        Err(e) => error!("🔁️ Reconciliation cycle failed: {e}"),
                    }
                },
                _ = shutdown.changed() => {
                    info!("🔁️ Order sync worker stopped");
                    break;
                },
            }
        }
    })
}

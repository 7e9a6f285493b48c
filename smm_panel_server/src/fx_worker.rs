use log::*;
use smm_panel_engine::{FxRateApi, FX_TTL};
use tokio::{sync::watch, task::JoinHandle};

use crate::integrations::RateClient;

/// Starts the FX refresh worker. It forces a fetch once per quote lifetime so request handlers almost always
/// hit the cache's fast path, and never run the refresh themselves.
pub fn start_fx_worker(fx: FxRateApi<RateClient>, mut shutdown: watch::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(FX_TTL);
        info!("💱️ FX refresh worker started (USD → {})", fx.currency());
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let rate = fx.refresh().await;
                    trace!("💱️ Pricing with 1 USD = {rate:.2} {}", fx.currency());
                },
                _ = shutdown.changed() => {
                    info!("💱️ FX refresh worker stopped");
                    break;
                },
            }
        }
    })
}

//! A small cache in front of the external exchange-rate source.
//!
//! Pricing must never fail because a free FX feed is down, so this API is infallible: it serves the cached
//! rate while it is fresh, refreshes when it is not, and degrades to the last known-good rate and finally to
//! the configured static default. A failed fetch still stamps the refresh time, so a dead feed is retried
//! once per TTL instead of on every request.

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use log::*;
use tokio::sync::RwLock;

use crate::traits::RateSource;

/// How long one quote is served before the source is asked again.
pub const FX_TTL: Duration = Duration::from_secs(5 * 60);

pub struct FxRateApi<R> {
    source: R,
    currency: String,
    fallback: f64,
    ttl: Duration,
    state: Arc<RwLock<FxState>>,
}

#[derive(Default)]
struct FxState {
    /// The last rate the source actually returned. `None` until the first successful fetch.
    rate: Option<f64>,
    fetched_at: Option<Instant>,
}

impl FxState {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.map(|t| t.elapsed() < ttl).unwrap_or(false)
    }
}

impl<R: Clone> Clone for FxRateApi<R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            currency: self.currency.clone(),
            fallback: self.fallback,
            ttl: self.ttl,
            state: Arc::clone(&self.state),
        }
    }
}

impl<R> Debug for FxRateApi<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FxRateApi (USD → {})", self.currency)
    }
}

impl<R> FxRateApi<R>
where R: RateSource
{
    pub fn new(source: R, currency: &str, fallback: f64) -> Self {
        Self {
            source,
            currency: currency.to_string(),
            fallback,
            ttl: FX_TTL,
            state: Arc::new(RwLock::new(FxState::default())),
        }
    }

    /// Overrides the quote lifetime. Meant for tests.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The current USD → configured-currency rate. USD itself short-circuits to 1.0 without touching the
    /// source or the cache.
    pub async fn rate(&self) -> f64 {
        if self.currency == "USD" {
            return 1.0;
        }
        {
            let state = self.state.read().await;
            if state.is_fresh(self.ttl) {
                return state.rate.unwrap_or(self.fallback);
            }
        }
        let mut state = self.state.write().await;
        if state.is_fresh(self.ttl) {
            return state.rate.unwrap_or(self.fallback);
        }
        self.refresh_locked(&mut state).await
    }

    /// Forces a fetch regardless of freshness. The background ticker calls this so request handlers almost
    /// always hit the fast path.
    pub async fn refresh(&self) -> f64 {
        if self.currency == "USD" {
            return 1.0;
        }
        let mut state = self.state.write().await;
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut FxState) -> f64 {
        match self.source.usd_rate(&self.currency).await {
            Ok(rate) => {
                debug!("💱️ USD → {} rate refreshed: {rate}", self.currency);
                state.rate = Some(rate);
                state.fetched_at = Some(Instant::now());
                rate
            },
            Err(e) => {
                state.fetched_at = Some(Instant::now());
                let rate = state.rate.unwrap_or(self.fallback);
                warn!("💱️ USD → {} fetch failed ({e}). Continuing with {rate}", self.currency);
                rate
            },
        }
    }
}

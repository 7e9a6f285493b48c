//! The cached, normalized view of the upstream panel's service list.
//!
//! Refreshing the catalog is expensive (one panel round trip plus an override load), so the result is kept
//! behind a TTL. Staleness is re-checked under the write lock, so concurrent callers either hit the fast
//! path or wait for the one refresh in flight; the panel is never fetched twice for one expiry.

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use log::*;
use tokio::sync::RwLock;

use crate::{
    catalog::{normalize_services, CatalogSettings, NormalizedService},
    spe_api::{errors::CatalogApiError, fx_api::FxRateApi},
    traits::{CatalogStore, PanelProvider, RateSource},
};

/// How long one catalog snapshot is served before the panel is asked again.
pub const CATALOG_TTL: Duration = Duration::from_secs(10 * 60);

pub struct CatalogApi<B, P, R> {
    db: B,
    provider: P,
    fx: FxRateApi<R>,
    settings: CatalogSettings,
    ttl: Duration,
    cache: Arc<RwLock<CatalogCache>>,
}

#[derive(Default)]
struct CatalogCache {
    services: Vec<NormalizedService>,
    refreshed_at: Option<Instant>,
}

impl CatalogCache {
    /// An empty snapshot is never fresh; a broken upstream must not be cached.
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.services.is_empty() && self.refreshed_at.map(|t| t.elapsed() < ttl).unwrap_or(false)
    }
}

impl<B: Clone, P: Clone, R: Clone> Clone for CatalogApi<B, P, R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            provider: self.provider.clone(),
            fx: self.fx.clone(),
            settings: self.settings.clone(),
            ttl: self.ttl,
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<B, P, R> Debug for CatalogApi<B, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({})", self.settings.source)
    }
}

impl<B, P, R> CatalogApi<B, P, R>
where
    B: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    pub fn new(db: B, provider: P, fx: FxRateApi<R>, settings: CatalogSettings) -> Self {
        Self { db, provider, fx, settings, ttl: CATALOG_TTL, cache: Arc::new(RwLock::new(CatalogCache::default())) }
    }

    /// Overrides the snapshot lifetime. Meant for tests that want to exercise expiry without waiting.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// The current catalog, normalized and priced in USD per 1000. Served from the cache when it is younger
    /// than the TTL; otherwise one refresh runs and every waiter gets its result. A refresh failure surfaces
    /// the error and leaves the previous snapshot in place for the next attempt.
    pub async fn fetch_services(&self) -> Result<Vec<NormalizedService>, CatalogApiError> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh(self.ttl) {
                trace!("🗂️ Serving {} services from the catalog cache", cache.services.len());
                return Ok(cache.services.clone());
            }
        }
        let mut cache = self.cache.write().await;
        if cache.is_fresh(self.ttl) {
            return Ok(cache.services.clone());
        }
        let raw = self.provider.fetch_catalog().await?;
        let overrides = self.db.fetch_service_overrides().await?;
        let fx_rate = self.fx.rate().await;
        let services = normalize_services(&raw, &overrides, &self.settings, fx_rate);
        debug!(
            "🗂️ Catalog refreshed. {} of {} panel services are sellable ({} overrides applied)",
            services.len(),
            raw.len(),
            overrides.len()
        );
        cache.services = services.clone();
        cache.refreshed_at = Some(Instant::now());
        Ok(services)
    }

    /// Resolves one service by composite catalog id or by the panel's raw service id.
    pub async fn find_service(
        &self,
        service_id: &str,
        source_service_id: &str,
    ) -> Result<Option<NormalizedService>, CatalogApiError> {
        let services = self.fetch_services().await?;
        Ok(services.into_iter().find(|s| {
            (!service_id.is_empty() && s.id == service_id)
                || (!source_service_id.is_empty() && s.source_service_id == source_service_id)
        }))
    }

    /// Forces the next fetch to refresh. Called after override writes so curation shows up immediately.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.refreshed_at = None;
        debug!("🗂️ Catalog cache invalidated");
    }
}

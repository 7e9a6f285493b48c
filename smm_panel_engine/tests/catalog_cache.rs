//! Cache behavior for the catalog snapshot and the FX quote.
mod support;

use std::time::Duration;

use smm_panel_engine::{db_types::ServiceOverride, CatalogApi, CatalogSettings, FxRateApi};
use support::{reel_views, FakePanel, FakeRates, FakeStore};

fn catalog(panel: &FakePanel, store: FakeStore, ttl: Duration) -> CatalogApi<FakeStore, FakePanel, FakeRates> {
    let fx = FxRateApi::new(FakeRates::quoting(1.0), "USD", 1.0);
    CatalogApi::new(store, panel.clone(), fx, CatalogSettings::new("panel", "USD")).with_ttl(ttl)
}

#[tokio::test]
async fn a_fresh_snapshot_is_served_without_a_panel_round_trip() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let api = catalog(&panel, FakeStore::default(), Duration::from_secs(60));

    let first = api.fetch_services().await.unwrap();
    let second = api.fetch_services().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(panel.catalog_calls(), 1);
}

#[tokio::test]
async fn invalidation_forces_the_next_fetch_to_refresh() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let api = catalog(&panel, FakeStore::default(), Duration::from_secs(60));

    api.fetch_services().await.unwrap();
    api.invalidate().await;
    // A curation edit shows up immediately, not a TTL later.
    panel.set_services(vec![reel_views(3.00)]);
    let services = api.fetch_services().await.unwrap();
    assert_eq!(panel.catalog_calls(), 2);
    assert_eq!(services[0].rate_per_1000, 3.00);
}

#[tokio::test]
async fn an_expired_snapshot_is_refreshed_exactly_once() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let api = catalog(&panel, FakeStore::default(), Duration::from_millis(20));

    api.fetch_services().await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    api.fetch_services().await.unwrap();
    api.fetch_services().await.unwrap();
    assert_eq!(panel.catalog_calls(), 2);
}

#[tokio::test]
async fn a_broken_panel_does_not_evict_a_fresh_snapshot() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let api = catalog(&panel, FakeStore::default(), Duration::from_secs(60));

    api.fetch_services().await.unwrap();
    panel.fail_catalog(true);
    // Still fresh, so the outage is invisible.
    assert_eq!(api.fetch_services().await.unwrap().len(), 1);

    // Once the snapshot is stale the failure surfaces to the caller, and the next healthy fetch recovers.
    api.invalidate().await;
    assert!(api.fetch_services().await.is_err());
    panel.fail_catalog(false);
    assert_eq!(api.fetch_services().await.unwrap().len(), 1);
}

#[tokio::test]
async fn hidden_overrides_are_dropped_from_the_snapshot() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let store = FakeStore::with_overrides(vec![ServiceOverride::hidden("2493")]);
    let api = catalog(&panel, store, Duration::from_secs(60));

    assert!(api.fetch_services().await.unwrap().is_empty());
}

#[tokio::test]
async fn find_service_resolves_both_id_forms() {
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    let api = catalog(&panel, FakeStore::default(), Duration::from_secs(60));

    let by_composite = api.find_service("panel:2493", "").await.unwrap().unwrap();
    let by_raw = api.find_service("", "2493").await.unwrap().unwrap();
    assert_eq!(by_composite.id, by_raw.id);
    assert!(api.find_service("panel:404", "").await.unwrap().is_none());
    // Both fetches after the first came out of the cache.
    assert_eq!(panel.catalog_calls(), 1);
}

//--------------------------------------       FX cache       ---------------------------------------------------------

#[tokio::test]
async fn a_fresh_quote_is_served_from_the_cache() {
    let rates = FakeRates::quoting(88.5);
    let fx = FxRateApi::new(rates.clone(), "INR", 83.0);

    assert_eq!(fx.rate().await, 88.5);
    assert_eq!(fx.rate().await, 88.5);
    assert_eq!(rates.calls(), 1);
}

#[tokio::test]
async fn a_dead_feed_degrades_to_the_last_known_good_quote() {
    let rates = FakeRates::quoting(88.5);
    let fx = FxRateApi::new(rates.clone(), "INR", 83.0).with_ttl(Duration::from_millis(20));

    assert_eq!(fx.rate().await, 88.5);
    rates.set_rate(None);
    tokio::time::sleep(Duration::from_millis(40)).await;
    // The refresh fails; pricing continues on the stale quote instead of the static default.
    assert_eq!(fx.rate().await, 88.5);
    assert_eq!(rates.calls(), 2);
}

#[tokio::test]
async fn a_feed_that_never_answered_falls_back_to_the_configured_rate() {
    let fx = FxRateApi::new(FakeRates::broken(), "INR", 83.0);
    assert_eq!(fx.rate().await, 83.0);
}

#[tokio::test]
async fn a_failed_refresh_is_not_retried_until_the_quote_expires() {
    let rates = FakeRates::broken();
    let fx = FxRateApi::new(rates.clone(), "INR", 83.0).with_ttl(Duration::from_secs(60));

    assert_eq!(fx.rate().await, 83.0);
    assert_eq!(fx.rate().await, 83.0);
    // The failure stamped the refresh time, so the dead feed is not hammered per request.
    assert_eq!(rates.calls(), 1);
}

#[tokio::test]
async fn usd_wallets_never_touch_the_feed() {
    let rates = FakeRates::quoting(88.5);
    let fx = FxRateApi::new(rates.clone(), "USD", 83.0);

    assert_eq!(fx.rate().await, 1.0);
    assert_eq!(fx.refresh().await, 1.0);
    assert_eq!(rates.calls(), 0);
}

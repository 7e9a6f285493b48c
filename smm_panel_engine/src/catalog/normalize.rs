use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::classify::{
        classify_platform,
        classify_type,
        classify_variant,
        is_hard_excluded,
        platform_from_category,
        type_from_keywords,
        Platform,
        ServiceType,
    },
    db_types::ServiceOverride,
    traits::PanelService,
};

/// Catalog-wide knobs: the composite-id prefix this reseller uses and the currency the panel quotes in.
/// When the panel currency is not USD, base rates are divided by the current FX rate so that everything
/// downstream prices in USD per 1000.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub source: String,
    pub currency: String,
}

impl CatalogSettings {
    pub fn new(source: &str, currency: &str) -> Self {
        Self { source: source.to_string(), currency: currency.to_string() }
    }

    pub fn quotes_in_usd(&self) -> bool {
        self.currency == "USD"
    }
}

/// One sellable catalog entry: a panel service merged with its local override, classified and priced in USD
/// per 1000. Field names follow the storefront's JSON contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedService {
    /// Stable composite id, `source:sid`.
    pub id: String,
    pub source: String,
    pub source_service_id: String,
    pub platform: Platform,
    #[serde(rename = "type")]
    pub service_type: String,
    pub variant: String,
    pub provider_name: String,
    /// Always the provider's own description; curated text goes in `display_description`.
    pub description: String,
    pub category: String,
    pub provider_category: String,
    pub rate_per_1000: f64,
    pub base_rate_per_1000: f64,
    pub provider_currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_description: String,
    pub min: i64,
    pub max: i64,
    pub refill: bool,
    pub dripfeed: bool,
    pub cancel: bool,
    pub average_time: Option<i64>,
    pub tags: Vec<String>,
    pub raw_provider_category: String,
    pub purchase_count: i64,
    pub display_id: String,
    pub targeting: String,
    pub quality: String,
    pub stability: String,
}

/// Normalizes the whole catalog. Order is preserved; hidden and unclassifiable services are dropped.
pub fn normalize_services(
    raw: &[PanelService],
    overrides: &HashMap<String, ServiceOverride>,
    settings: &CatalogSettings,
    fx_rate: f64,
) -> Vec<NormalizedService> {
    raw.iter().filter_map(|svc| normalize_service(svc, overrides.get(&svc.sid), settings, fx_rate)).collect()
}

/// Classifies and merges a single service. Returns `None` for hidden services and for services that cannot
/// be pinned to a platform and type even after the lexical fallbacks.
pub fn normalize_service(
    raw: &PanelService,
    ov: Option<&ServiceOverride>,
    settings: &CatalogSettings,
    fx_rate: f64,
) -> Option<NormalizedService> {
    let mut platform = classify_platform(&raw.category, &raw.name);
    let excluded = is_hard_excluded(&raw.category, &raw.name);
    let mut service_type = classify_type(&raw.category, &raw.name).map(|t| t.as_str().to_string());
    // The variant is pinned to the regex-detected platform. A platform recovered later through the category
    // fallback keeps the "any" variant.
    let variant = platform.map(|p| classify_variant(p, &raw.category, &raw.name)).unwrap_or("any");

    let mut base_rate = raw.rate_per_1000;
    if !settings.quotes_in_usd() && base_rate > 0.0 && fx_rate > 0.0 {
        base_rate /= fx_rate;
    }
    let mut rate = base_rate;

    let mut display_name = String::new();
    let mut display_description = String::new();
    let mut category = raw.category.clone();
    let mut provider_category = raw.category.clone();
    let mut purchase_count = 0;
    let mut display_id = String::new();
    let mut tags: Vec<String> = Vec::new();
    let mut refill_override = None;
    let mut cancel_override = None;
    let mut dripfeed_override = None;
    let mut targeting = String::new();
    let mut quality = String::new();
    let mut stability = String::new();

    if let Some(ov) = ov {
        if ov.is_hidden {
            return None;
        }
        if !ov.display_name.is_empty() {
            display_name = ov.display_name.clone();
        }
        if !ov.display_description.is_empty() {
            display_description = ov.display_description.clone();
        }
        if ov.rate_multiplier > 0.0 {
            rate *= ov.rate_multiplier;
        }
        if let Some(t) = &ov.tags {
            tags = t.clone();
        }
        if let Some(cat) = &ov.category {
            if !cat.is_empty() {
                category = cat.clone();
                // A curated category that names a known type retargets the classification outright.
                let low_cat = cat.to_lowercase();
                if let Some(known) = ServiceType::ALL.iter().find(|t| t.as_str() == low_cat) {
                    service_type = Some(known.as_str().to_string());
                }
            }
        }
        if let Some(pcat) = &ov.provider_category {
            if !pcat.is_empty() {
                provider_category = pcat.clone();
            }
        }
        purchase_count = ov.purchase_count;
        display_id = ov.display_id.clone().unwrap_or_default();
        refill_override = ov.refill;
        cancel_override = ov.cancel;
        dripfeed_override = ov.dripfeed;
        if let Some(st) = &ov.service_type {
            if !st.is_empty() && st != "default" {
                service_type = Some(st.clone());
            }
        }
        targeting = ov.targeting.clone().unwrap_or_default();
        quality = ov.quality.clone().unwrap_or_default();
        stability = ov.stability.clone().unwrap_or_default();
    }

    if platform.is_none() && !category.is_empty() {
        platform = platform_from_category(&category);
    }
    let platform = platform?;

    // The keyword fallback respects the hard-exclude veto; the original scored pass already refused these.
    if service_type.is_none() && !excluded {
        service_type = type_from_keywords(&category, &raw.name).map(|t| t.as_str().to_string());
    }
    let service_type = service_type?;

    let refill = refill_override.unwrap_or(raw.refill);
    let cancel = cancel_override.unwrap_or(raw.cancel);
    let dripfeed = dripfeed_override.unwrap_or(raw.dripfeed);

    Some(NormalizedService {
        id: format!("{}:{}", settings.source, raw.sid),
        source: settings.source.clone(),
        source_service_id: raw.sid.clone(),
        platform,
        service_type,
        variant: variant.to_string(),
        provider_name: raw.name.clone(),
        description: raw.description.clone(),
        category,
        provider_category,
        rate_per_1000: rate,
        base_rate_per_1000: base_rate,
        provider_currency: settings.currency.clone(),
        display_name,
        display_description,
        min: raw.min,
        max: raw.max,
        refill,
        dripfeed,
        cancel,
        average_time: raw.average_time.filter(|t| *t > 0),
        tags,
        raw_provider_category: raw.category.clone(),
        purchase_count,
        display_id,
        targeting,
        quality,
        stability,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn usd_settings() -> CatalogSettings {
        CatalogSettings::new("panel", "USD")
    }

    fn reel_views() -> PanelService {
        PanelService {
            sid: "2493".into(),
            name: "Instagram Reel Views [Fast]".into(),
            service_type: "Default".into(),
            category: "Views".into(),
            rate_per_1000: 0.90,
            min: 100,
            max: 1_000_000,
            refill: false,
            cancel: true,
            dripfeed: false,
            average_time: Some(37),
            description: "Start 0-15 min".into(),
        }
    }

    #[test]
    fn classified_service_gets_a_composite_id_and_usd_rate() {
        let svc = normalize_service(&reel_views(), None, &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.id, "panel:2493");
        assert_eq!(svc.source_service_id, "2493");
        assert_eq!(svc.platform, Platform::Instagram);
        assert_eq!(svc.service_type, "views");
        assert_eq!(svc.variant, "reel");
        assert_eq!(svc.rate_per_1000, 0.90);
        assert_eq!(svc.base_rate_per_1000, 0.90);
        assert_eq!(svc.average_time, Some(37));
        assert!(svc.display_name.is_empty());
        assert_eq!(svc.purchase_count, 0);
    }

    #[test]
    fn non_usd_quotes_are_divided_by_the_fx_rate() {
        let settings = CatalogSettings::new("panel", "INR");
        let mut raw = reel_views();
        raw.rate_per_1000 = 83.0;
        let svc = normalize_service(&raw, None, &settings, 83.0).unwrap();
        assert_eq!(svc.base_rate_per_1000, 1.0);
        assert_eq!(svc.rate_per_1000, 1.0);
        assert_eq!(svc.provider_currency, "INR");
    }

    #[test]
    fn hidden_overrides_remove_the_service() {
        let ov = ServiceOverride::hidden("2493");
        assert!(normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).is_none());
    }

    #[test]
    fn multiplier_applies_to_the_effective_rate_only() {
        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            rate_multiplier: 1.5,
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.base_rate_per_1000, 0.90);
        assert!((svc.rate_per_1000 - 1.35).abs() < 1e-9);
    }

    #[test]
    fn non_positive_multiplier_inherits_the_provider_rate() {
        let ov = ServiceOverride { source_service_id: "2493".into(), ..ServiceOverride::default() };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.rate_per_1000, 0.90);
    }

    #[test]
    fn display_fields_overwrite_only_when_non_empty() {
        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            display_name: "Reel Views (Premium)".into(),
            display_id: Some("IG-201".into()),
            purchase_count: 42,
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.display_name, "Reel Views (Premium)");
        assert!(svc.display_description.is_empty());
        assert_eq!(svc.display_id, "IG-201");
        assert_eq!(svc.purchase_count, 42);
        // The provider's own text is untouched.
        assert_eq!(svc.provider_name, "Instagram Reel Views [Fast]");
        assert_eq!(svc.description, "Start 0-15 min");
    }

    #[test]
    fn tri_state_flags_override_the_provider_booleans() {
        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            refill: Some(true),
            cancel: Some(false),
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert!(svc.refill);
        assert!(!svc.cancel);
        assert!(!svc.dripfeed);
    }

    #[test]
    fn known_type_category_retargets_the_service_type() {
        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            category: Some("Likes".into()),
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.service_type, "likes");
        assert_eq!(svc.category, "Likes");
        assert_eq!(svc.raw_provider_category, "Views");
    }

    #[test]
    fn explicit_service_type_override_wins_outright() {
        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            category: Some("Likes".into()),
            service_type: Some("premium views".into()),
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.service_type, "premium views");

        let ov = ServiceOverride {
            source_service_id: "2493".into(),
            service_type: Some("default".into()),
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&reel_views(), Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.service_type, "views");
    }

    #[test]
    fn curated_category_recovers_an_unclassifiable_platform() {
        let raw = PanelService {
            sid: "77".into(),
            name: "Premium follower pack".into(),
            category: "Top sellers".into(),
            ..PanelService::default()
        };
        assert!(normalize_service(&raw, None, &usd_settings(), 83.0).is_none());

        let ov = ServiceOverride {
            source_service_id: "77".into(),
            category: Some("Instagram Growth".into()),
            ..ServiceOverride::default()
        };
        let svc = normalize_service(&raw, Some(&ov), &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.platform, Platform::Instagram);
        // Recovered platforms never get a variant.
        assert_eq!(svc.variant, "any");
        assert_eq!(svc.service_type, "followers");
    }

    #[test]
    fn hard_exclude_vetoes_the_keyword_fallback_too() {
        let raw = PanelService {
            sid: "78".into(),
            name: "Instagram DM follower outreach".into(),
            category: "Instagram".into(),
            ..PanelService::default()
        };
        assert!(normalize_service(&raw, None, &usd_settings(), 83.0).is_none());
    }

    #[test]
    fn zero_average_time_reads_as_unknown() {
        let mut raw = reel_views();
        raw.average_time = Some(0);
        let svc = normalize_service(&raw, None, &usd_settings(), 83.0).unwrap();
        assert_eq!(svc.average_time, None);
    }

    #[test]
    fn storefront_json_contract_is_stable() {
        let svc = normalize_service(&reel_views(), None, &usd_settings(), 83.0).unwrap();
        let json = serde_json::to_value(&svc).unwrap();
        assert_eq!(json["id"], "panel:2493");
        assert_eq!(json["sourceServiceId"], "2493");
        assert_eq!(json["platform"], "instagram");
        assert_eq!(json["type"], "views");
        assert_eq!(json["ratePer1000"], 0.90);
        assert_eq!(json["baseRatePer1000"], 0.90);
        assert_eq!(json["averageTime"], 37);
        assert_eq!(json["rawProviderCategory"], "Views");
        // Unset display fields are omitted entirely.
        assert!(json.get("displayName").is_none());
        assert!(json.get("displayDescription").is_none());
    }
}

//! Turning the panel's free-text service list into a curated catalog.
//!
//! Panels describe services with nothing better than a name and a category string ("Instagram Reel Views
//! [Indian] 🔥"). The [`classify`] half of this module pins each service to a closed platform / service-type /
//! variant vocabulary with ordered regex tables; the [`normalize`] half merges the classified record with its
//! locally stored [`ServiceOverride`](crate::db_types::ServiceOverride) and produces the
//! [`NormalizedService`] view the storefront and the order coordinator work from. Services that cannot be
//! classified on either axis are filtered out, not errors.
mod classify;
mod normalize;

pub use classify::{
    classify_platform,
    classify_type,
    classify_variant,
    is_hard_excluded,
    platform_from_category,
    type_from_keywords,
    Platform,
    ServiceType,
};
pub use normalize::{normalize_service, normalize_services, CatalogSettings, NormalizedService};

use log::*;
use spg_common::Secret;

pub const DEFAULT_PANEL_URL: &str = "https://example-panel.com/api/v2";

#[derive(Debug, Clone, Default)]
pub struct PanelConfig {
    /// The single endpoint every panel action is POSTed to.
    pub api_url: String,
    pub api_key: Secret<String>,
    /// The prefix used for composite service ids (`source:sid`). One gateway instance talks to one panel.
    pub source: String,
    /// ISO currency the panel quotes rates in. Anything other than `USD` triggers FX normalization.
    pub currency: String,
}

impl PanelConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SPG_PANEL_URL").unwrap_or_else(|_| {
            warn!("SPG_PANEL_URL not set, using (probably useless) default");
            DEFAULT_PANEL_URL.to_string()
        });
        let api_key = Secret::new(std::env::var("SPG_PANEL_API_KEY").unwrap_or_else(|_| {
            warn!("SPG_PANEL_API_KEY not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let source = std::env::var("SPG_PANEL_SOURCE").unwrap_or_else(|_| {
            info!("SPG_PANEL_SOURCE not set, using 'panel' as the composite id prefix");
            "panel".to_string()
        });
        let currency = std::env::var("SPG_PANEL_CURRENCY").unwrap_or_else(|_| {
            info!("SPG_PANEL_CURRENCY not set, assuming the panel quotes rates in USD");
            "USD".to_string()
        });
        Self { api_url, api_key, source, currency }
    }
}

use std::env;

use log::*;
use panel_tools::{PanelConfig, DEFAULT_FX_URL};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_FX_CURRENCY: &str = "INR";
const DEFAULT_FX_FALLBACK_RATE: f64 = 83.0;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Upstream panel endpoint, key, composite-id prefix and quote currency.
    pub panel: PanelConfig,
    pub fx: FxConfig,
}

#[derive(Clone, Debug)]
pub struct FxConfig {
    pub base_url: String,
    /// The wallet currency. `USD` disables FX lookups entirely.
    pub currency: String,
    /// The static rate pricing falls back to when the feed has never answered.
    pub fallback_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            panel: PanelConfig::default(),
            fx: FxConfig::default(),
        }
    }
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FX_URL.to_string(),
            currency: DEFAULT_FX_CURRENCY.to_string(),
            fallback_rate: DEFAULT_FX_FALLBACK_RATE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🛠️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, \
                         instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🛠️ SPG_DATABASE_URL is not set. Please set it to the URL for the SPG database.");
            String::default()
        });
        let panel = PanelConfig::new_from_env_or_default();
        let fx = FxConfig::from_env_or_default();
        Self { host, port, database_url, panel, fx }
    }
}

impl FxConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("SPG_FX_URL").ok().unwrap_or_else(|| {
            info!("🛠️ SPG_FX_URL is not set. Using the default rate source, {DEFAULT_FX_URL}");
            DEFAULT_FX_URL.to_string()
        });
        let currency = env::var("SPG_FX_CURRENCY").ok().unwrap_or_else(|| {
            info!("🛠️ SPG_FX_CURRENCY is not set. Pricing wallets in {DEFAULT_FX_CURRENCY}");
            DEFAULT_FX_CURRENCY.to_string()
        });
        let fallback_rate = env::var("SPG_FX_FALLBACK_RATE")
            .map(|s| {
                s.parse::<f64>().unwrap_or_else(|e| {
                    error!(
                        "🛠️ {s} is not a valid rate for SPG_FX_FALLBACK_RATE. {e} Using the default, \
                         {DEFAULT_FX_FALLBACK_RATE}, instead."
                    );
                    DEFAULT_FX_FALLBACK_RATE
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FX_FALLBACK_RATE);
        Self { base_url, currency, fallback_rate }
    }
}

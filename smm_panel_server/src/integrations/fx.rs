use panel_tools::{FxApi, PanelApiError};
use smm_panel_engine::traits::{RateSource, RateSourceError};

/// [`FxApi`] dressed up as the engine's [`RateSource`].
#[derive(Clone)]
pub struct RateClient {
    api: FxApi,
}

impl RateClient {
    pub fn new(base_url: &str) -> Result<Self, PanelApiError> {
        let api = FxApi::new(base_url)?;
        Ok(Self { api })
    }
}

impl RateSource for RateClient {
    async fn usd_rate(&self, currency: &str) -> Result<f64, RateSourceError> {
        self.api.usd_rate(currency).await.map_err(|e| match e {
            PanelApiError::JsonError(s) => RateSourceError::Payload(s),
            other => RateSourceError::Network(other.to_string()),
        })
    }
}

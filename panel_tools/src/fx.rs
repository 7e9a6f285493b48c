use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde::Deserialize;

use crate::PanelApiError;

/// FX lookups sit on the catalog-refresh path, so they get a tighter timeout than panel calls.
pub const FX_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_FX_URL: &str = "https://open.er-api.com/v6";

/// Client for an open.er-api.com-compatible rate source: `GET {base}/latest/USD` answered with
/// `{"rates": {"INR": 83.1, ...}}`.
#[derive(Clone)]
pub struct FxApi {
    base_url: String,
    client: Arc<Client>,
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

impl FxApi {
    pub fn new(base_url: &str) -> Result<Self, PanelApiError> {
        let client = Client::builder()
            .timeout(FX_CLIENT_TIMEOUT)
            .build()
            .map_err(|e| PanelApiError::Initialization(e.to_string()))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client: Arc::new(client) })
    }

    /// Fetches how many units of `currency` one USD buys. A missing or non-positive quote is a failure, not a
    /// zero; callers fall back to their last known-good rate.
    pub async fn usd_rate(&self, currency: &str) -> Result<f64, PanelApiError> {
        let url = format!("{}/latest/USD", self.base_url);
        let response =
            self.client.get(&url).send().await.map_err(|e| PanelApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PanelApiError::RequestError(e.to_string()))?;
            return Err(PanelApiError::ResponseError { status, message });
        }
        let rates = response.json::<RatesResponse>().await.map_err(|e| PanelApiError::JsonError(e.to_string()))?;
        match rates.rates.get(currency) {
            Some(rate) if *rate > 0.0 => {
                debug!("Fetched live FX rate: 1 USD = {rate:.2} {currency}");
                Ok(*rate)
            },
            _ => Err(PanelApiError::JsonError(format!("No positive {currency} quote in FX response"))),
        }
    }
}

use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::PanelConfig,
    data_objects::{AddOrderResult, PanelStatusRecord, RawPanelService},
    PanelApiError,
};

/// Client timeout for panel calls. The panel protocol has no explicit timeout of its own; without one a slow
/// provider stalls whichever request handler is refreshing the catalog.
pub const PANEL_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct PanelApi {
    config: PanelConfig,
    client: Arc<Client>,
}

impl PanelApi {
    pub fn new(config: PanelConfig) -> Result<Self, PanelApiError> {
        let client = Client::builder()
            .timeout(PANEL_CLIENT_TIMEOUT)
            .build()
            .map_err(|e| PanelApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Every panel v2 action is the same call shape: POST the one endpoint with `key`, `action` and
    /// action-specific form fields, then decode the JSON body.
    async fn panel_query<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, PanelApiError> {
        let mut form = Vec::with_capacity(params.len() + 2);
        form.push(("key", self.config.api_key.reveal().clone()));
        form.push(("action", action.to_string()));
        form.extend_from_slice(params);
        trace!("Sending panel query: action={action}");
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PanelApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PanelApiError::RequestError(e.to_string()))?;
            return Err(PanelApiError::ResponseError { status, message });
        }
        trace!("Panel query successful: action={action}");
        response.json::<T>().await.map_err(|e| PanelApiError::JsonError(e.to_string()))
    }

    /// Fetches the panel's full raw service list.
    pub async fn services(&self) -> Result<Vec<RawPanelService>, PanelApiError> {
        debug!("Fetching service list from {}", self.config.api_url);
        let services: Vec<RawPanelService> = self.panel_query("services", &[]).await?;
        info!("Fetched {} raw services from the panel", services.len());
        Ok(services)
    }

    /// Submits an order. A decoded response is returned whether the panel accepted or rejected it; callers
    /// check [`AddOrderResult::error_text`] because rejection is an order-level outcome, not a call failure.
    pub async fn add_order(
        &self,
        service: &str,
        quantity: i64,
        link: &str,
    ) -> Result<AddOrderResult, PanelApiError> {
        debug!("Placing panel order: service={service}, quantity={quantity}");
        let params =
            [("service", service.to_string()), ("quantity", quantity.to_string()), ("link", link.to_string())];
        self.panel_query("add", &params).await
    }

    /// Batch status poll. The response is keyed by provider order id.
    pub async fn order_status(
        &self,
        order_ids: &[String],
    ) -> Result<HashMap<String, PanelStatusRecord>, PanelApiError> {
        debug!("Fetching panel status for {} orders", order_ids.len());
        let params = [("orders", order_ids.join(","))];
        self.panel_query("status", &params).await
    }

    /// Best-effort provider-side cancellation. The acknowledgement shape varies by panel, so the raw value is
    /// returned for logging.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, PanelApiError> {
        debug!("Requesting panel-side cancel of order {order_id}");
        let params = [("order", order_id.to_string())];
        self.panel_query("cancel", &params).await
    }
}

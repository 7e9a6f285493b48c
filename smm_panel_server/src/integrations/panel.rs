use std::collections::HashMap;

use panel_tools::{coerce_bool, PanelApi, PanelApiError, PanelConfig, RawPanelService};
use smm_panel_engine::traits::{
    PanelOrderRequest,
    PanelProvider,
    PanelService,
    PanelSubmission,
    ProviderError,
    RemoteOrderStatus,
};

/// [`PanelApi`] dressed up as the engine's [`PanelProvider`].
#[derive(Clone)]
pub struct PanelClient {
    api: PanelApi,
}

impl PanelClient {
    pub fn new(config: PanelConfig) -> Result<Self, PanelApiError> {
        let api = PanelApi::new(config)?;
        Ok(Self { api })
    }
}

fn provider_error(e: PanelApiError) -> ProviderError {
    match e {
        PanelApiError::JsonError(s) => ProviderError::Payload(s),
        other => ProviderError::Network(other.to_string()),
    }
}

/// One-time coercion of a raw wire record into the canonical service shape.
fn canonical_service(raw: &RawPanelService) -> PanelService {
    let average_time = raw.average_time();
    PanelService {
        sid: raw.sid(),
        name: raw.name.trim().to_string(),
        service_type: raw.service_type.trim().to_string(),
        category: raw.category.trim().to_string(),
        rate_per_1000: raw.rate(),
        min: raw.min(),
        max: raw.max(),
        refill: coerce_bool(&raw.refill),
        cancel: coerce_bool(&raw.cancel),
        dripfeed: coerce_bool(&raw.dripfeed),
        average_time: (average_time > 0).then_some(average_time),
        description: raw.description().trim().to_string(),
    }
}

impl PanelProvider for PanelClient {
    async fn fetch_catalog(&self) -> Result<Vec<PanelService>, ProviderError> {
        let raw = self.api.services().await.map_err(provider_error)?;
        Ok(raw.iter().map(canonical_service).collect())
    }

    async fn submit_order(&self, request: &PanelOrderRequest) -> Result<PanelSubmission, ProviderError> {
        let result =
            self.api.add_order(&request.service, request.quantity, &request.link).await.map_err(provider_error)?;
        let raw_response = serde_json::to_value(&result).unwrap_or_default();
        Ok(PanelSubmission { provider_order_id: result.order_id(), rejection: result.error_text(), raw_response })
    }

    async fn fetch_statuses(
        &self,
        provider_order_ids: &[String],
    ) -> Result<HashMap<String, RemoteOrderStatus>, ProviderError> {
        let records = self.api.order_status(provider_order_ids).await.map_err(provider_error)?;
        Ok(records
            .into_iter()
            .map(|(id, rec)| {
                let status = RemoteOrderStatus {
                    status: rec.status(),
                    remains: rec.remains(),
                    start_count: rec.start_count(),
                };
                (id, status)
            })
            .collect())
    }

    async fn cancel_order(&self, provider_order_id: &str) -> Result<serde_json::Value, ProviderError> {
        self.api.cancel_order(provider_order_id).await.map_err(provider_error)
    }
}

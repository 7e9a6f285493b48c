use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Panel request failed: {0}")]
    Network(String),
    #[error("Panel response was unusable: {0}")]
    Payload(String),
}

/// One service as the upstream panel advertises it, after the wire-level coercions have run. The panel's JSON
/// mixes numbers, numeric strings and junk in the same fields; by the time a record reaches the engine it has
/// this canonical shape and keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PanelService {
    /// The panel's service id. Always handled as a string, whatever the wire sent.
    pub sid: String,
    pub name: String,
    /// The panel's own type label. Classification ignores it; it is kept for completeness.
    pub service_type: String,
    pub category: String,
    /// Rate per 1000 units in the panel's quote currency.
    pub rate_per_1000: f64,
    pub min: i64,
    pub max: i64,
    pub refill: bool,
    pub cancel: bool,
    pub dripfeed: bool,
    pub average_time: Option<i64>,
    pub description: String,
}

/// The order hand-off payload. `service` is the panel's raw service id, not the composite catalog id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelOrderRequest {
    pub service: String,
    pub quantity: i64,
    pub link: String,
}

/// What came back from the panel's `add` action. A decoded rejection is not a transport error: the panel
/// answered, it just said no. The coordinator treats both the same way (compensate), but only transport and
/// decode problems surface as [`ProviderError`].
#[derive(Debug, Clone, Default)]
pub struct PanelSubmission {
    pub provider_order_id: Option<String>,
    pub rejection: Option<String>,
    pub raw_response: serde_json::Value,
}

impl PanelSubmission {
    pub fn accepted(provider_order_id: &str, raw_response: serde_json::Value) -> Self {
        Self { provider_order_id: Some(provider_order_id.to_string()), rejection: None, raw_response }
    }

    pub fn rejected(reason: &str) -> Self {
        Self {
            provider_order_id: None,
            rejection: Some(reason.to_string()),
            raw_response: serde_json::json!({ "error": reason }),
        }
    }
}

/// One order's status as reported by the panel's batch `status` action. `status` is `None` when the panel
/// returned something unusable for that order; numeric fields default to zero when unparseable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOrderStatus {
    pub status: Option<String>,
    pub remains: i64,
    pub start_count: i64,
}

/// The upstream SMM panel.
#[allow(async_fn_in_trait)]
pub trait PanelProvider: Clone {
    /// Fetches the full service list.
    async fn fetch_catalog(&self) -> Result<Vec<PanelService>, ProviderError>;

    /// Submits one order. A rejection the panel expressed in its payload comes back as a successful
    /// [`PanelSubmission`] with `rejection` set, not as an `Err`.
    async fn submit_order(&self, request: &PanelOrderRequest) -> Result<PanelSubmission, ProviderError>;

    /// Fetches the status of many orders in one call, keyed by the panel's order id. Orders the panel does not
    /// know are simply absent from the map.
    async fn fetch_statuses(
        &self,
        provider_order_ids: &[String],
    ) -> Result<HashMap<String, RemoteOrderStatus>, ProviderError>;

    /// Asks the panel to cancel an order. Best effort; the acknowledgement is only ever logged.
    async fn cancel_order(&self, provider_order_id: &str) -> Result<serde_json::Value, ProviderError>;
}

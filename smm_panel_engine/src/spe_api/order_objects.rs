use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Cents;
use sqlx::FromRow;

use crate::db_types::{Order, OrderStatusType};

/// The order-placement request as the storefront sends it. `service_id` is the composite catalog id,
/// `source_service_id` the panel's own id; either is enough to resolve the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub source_service_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub link: String,
}

impl NewOrderRequest {
    /// The id to report back when the service cannot be resolved.
    pub fn requested_id(&self) -> &str {
        if self.service_id.is_empty() {
            &self.source_service_id
        } else {
            &self.service_id
        }
    }
}

/// The outcome of a placement attempt that made it past the wallet debit. A panel rejection is not an API
/// error: the charge has already been compensated and the caller gets the rejection text to display.
#[derive(Debug, Clone)]
pub enum PlacedOrder {
    /// The panel accepted the order.
    Submitted {
        order: Order,
        panel_response: serde_json::Value,
    },
    /// The panel refused, could not be reached, or a concurrent cancel finalized the order first. Either way
    /// the wallet has been credited back in full.
    Rejected { order: Order, error: String },
}

impl PlacedOrder {
    pub fn order(&self) -> &Order {
        match self {
            PlacedOrder::Submitted { order, .. } => order,
            PlacedOrder::Rejected { order, .. } => order,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, PlacedOrder::Submitted { .. })
    }
}

/// One order row joined with its curated display metadata, as the order-history listing wants it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub service_id: String,
    pub display_id: Option<String>,
    pub display_name: Option<String>,
    pub amount_cents: Cents,
    pub quantity: i64,
    pub status: OrderStatusType,
    pub link: String,
    pub start_count: i64,
    pub remains: i64,
    pub provider_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// The five statuses the storefront groups under its "active" tab.
    pub fn in_flight() -> Self {
        use OrderStatusType::*;
        Self { status: Some(vec![Pending, Processing, Submitted, InProgress, Active]), ..Self::default() }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.since.is_none() && self.until.is_none()
    }
}

impl std::fmt::Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn in_flight_filter_covers_the_active_tab() {
        let filter = OrderQueryFilter::in_flight();
        let statuses = filter.status.unwrap();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.contains(&OrderStatusType::Pending));
        assert!(statuses.contains(&OrderStatusType::Processing));
        assert!(statuses.contains(&OrderStatusType::Submitted));
        assert!(statuses.contains(&OrderStatusType::InProgress));
        assert!(statuses.contains(&OrderStatusType::Active));
    }

    #[test]
    fn request_reports_whichever_id_was_given() {
        let req = NewOrderRequest { service_id: "panel:42".into(), ..NewOrderRequest::default() };
        assert_eq!(req.requested_id(), "panel:42");
        let req = NewOrderRequest { source_service_id: "42".into(), ..NewOrderRequest::default() };
        assert_eq!(req.requested_id(), "42");
    }

    #[test]
    fn placement_request_accepts_the_storefront_shape() {
        let req: NewOrderRequest = serde_json::from_str(
            r#"{"serviceId":"panel:2493","sourceServiceId":"2493","quantity":500,"link":"https://example.com/p/1"}"#,
        )
        .unwrap();
        assert_eq!(req.service_id, "panel:2493");
        assert_eq!(req.source_service_id, "2493");
        assert_eq!(req.quantity, 500);
    }
}

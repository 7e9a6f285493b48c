//! Request and response shapes specific to the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smm_panel_engine::{
    db_types::{Order, OrderStatusType},
    order_objects::{OrderQueryFilter, PlacedOrder},
};

use crate::errors::ServerError;

/// What `POST /orders` answers. Both panel outcomes are 200s: a rejection means the wallet has already been
/// made whole, and the storefront shows `error` to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult {
    pub submitted: bool,
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PlacedOrder> for PlacementResult {
    fn from(placed: PlacedOrder) -> Self {
        match placed {
            PlacedOrder::Submitted { order, .. } => Self { submitted: true, order, error: None },
            PlacedOrder::Rejected { order, error } => Self { submitted: false, order, error: Some(error) },
        }
    }
}

/// Optional body of `POST /orders/{id}/refund`. Omitting it (or the amount) refunds the whole unrefunded
/// remainder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundParams {
    pub amount_cents: Option<i64>,
}

/// Query string of `GET /orders`. `status` is a comma-separated list of status names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQueryParams {
    pub status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryParams {
    pub fn to_filter(&self) -> Result<OrderQueryFilter, ServerError> {
        let mut filter = OrderQueryFilter::default();
        if let Some(statuses) = &self.status {
            for token in statuses.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let status = token
                    .parse::<OrderStatusType>()
                    .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
                filter = filter.with_status(status);
            }
        }
        if let Some(since) = self.since {
            filter = filter.since(since);
        }
        if let Some(until) = self.until {
            filter = filter.until(until);
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_lists_parse_into_filters() {
        let params = OrderQueryParams { status: Some("submitted, active".into()), ..Default::default() };
        let filter = params.to_filter().unwrap();
        let statuses = filter.status.unwrap();
        assert_eq!(statuses, vec![OrderStatusType::Submitted, OrderStatusType::Active]);
    }

    #[test]
    fn an_empty_query_is_an_empty_filter() {
        let filter = OrderQueryParams::default().to_filter().unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn unknown_statuses_are_a_bad_request() {
        let params = OrderQueryParams { status: Some("paused".into()), ..Default::default() };
        let err = params.to_filter().unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequestBody(_)));
    }
}

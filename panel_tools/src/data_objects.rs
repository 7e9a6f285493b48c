use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::{coerce_f64, coerce_i64};

/// One service as the panel's `action=services` call returns it. Panels disagree about field types (ids and
/// rates arrive as numbers or strings, flags as bools, numbers or words), so everything contentious is kept
/// as a raw [`Value`] with a canonicalizing accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPanelService {
    #[serde(default)]
    pub service: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rate: Value,
    #[serde(default)]
    pub min: Value,
    #[serde(default)]
    pub max: Value,
    #[serde(default)]
    pub refill: Value,
    #[serde(default)]
    pub dripfeed: Value,
    #[serde(default)]
    pub cancel: Value,
    #[serde(default)]
    pub average_time: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub desc: String,
}

impl RawPanelService {
    /// The provider's service id as a string, whatever type it arrived as. Empty when the record carries no
    /// usable id.
    pub fn sid(&self) -> String {
        match &self.service {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    pub fn rate(&self) -> f64 {
        coerce_f64(&self.rate)
    }

    pub fn min(&self) -> i64 {
        coerce_i64(&self.min)
    }

    pub fn max(&self) -> i64 {
        coerce_i64(&self.max)
    }

    pub fn average_time(&self) -> i64 {
        coerce_i64(&self.average_time)
    }

    /// Some panels populate `description`, others `desc`.
    pub fn description(&self) -> &str {
        if self.description.is_empty() {
            &self.desc
        } else {
            &self.description
        }
    }
}

/// Response of `action=add`. Either `order` holds the new provider order id (string or number) or `error`
/// explains the rejection. Unknown fields are kept so the caller can persist the response verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOrderResult {
    #[serde(default)]
    pub order: Value,
    #[serde(default)]
    pub error: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddOrderResult {
    /// The provider-assigned order id, if the order was accepted.
    pub fn order_id(&self) -> Option<String> {
        match &self.order {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => {
                n.as_i64().map(|i| i.to_string()).or_else(|| n.as_f64().map(|f| format!("{f:.0}")))
            },
            _ => None,
        }
    }

    /// The rejection message, if the provider reported one. A non-null `error` of any type counts: treating
    /// an unrecognized error shape as success would debit the user for an order the panel never accepted.
    pub fn error_text(&self) -> Option<String> {
        match &self.error {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// One entry of the `action=status` response map. Field types are as unreliable as everywhere else in the
/// protocol; records without a usable status string are skipped by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelStatusRecord {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub remains: Value,
    #[serde(default)]
    pub start_count: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PanelStatusRecord {
    pub fn status(&self) -> Option<String> {
        match &self.status {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    pub fn remains(&self) -> i64 {
        coerce_i64(&self.remains)
    }

    pub fn start_count(&self) -> i64 {
        coerce_i64(&self.start_count)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn service_ids_normalize_to_strings() {
        let svc: RawPanelService = serde_json::from_value(json!({"service": 2493, "name": "IG Likes"})).unwrap();
        assert_eq!(svc.sid(), "2493");
        let svc: RawPanelService = serde_json::from_value(json!({"service": " 77 ", "name": "IG Likes"})).unwrap();
        assert_eq!(svc.sid(), "77");
        let svc: RawPanelService = serde_json::from_value(json!({"name": "orphan"})).unwrap();
        assert_eq!(svc.sid(), "");
    }

    #[test]
    fn add_result_reads_ids_and_errors() {
        let ok: AddOrderResult = serde_json::from_value(json!({"order": 910_551})).unwrap();
        assert_eq!(ok.order_id().as_deref(), Some("910551"));
        assert_eq!(ok.error_text(), None);

        let ok: AddOrderResult = serde_json::from_value(json!({"order": "A-17"})).unwrap();
        assert_eq!(ok.order_id().as_deref(), Some("A-17"));

        let rejected: AddOrderResult = serde_json::from_value(json!({"error": "Not enough funds"})).unwrap();
        assert_eq!(rejected.order_id(), None);
        assert_eq!(rejected.error_text().as_deref(), Some("Not enough funds"));

        let odd: AddOrderResult = serde_json::from_value(json!({"error": {"code": 7}})).unwrap();
        assert!(odd.error_text().is_some());
    }

    #[test]
    fn status_records_keep_their_loose_fields() {
        let rec: PanelStatusRecord =
            serde_json::from_value(json!({"status": "In progress", "remains": "250", "start_count": null}))
                .unwrap();
        assert_eq!(rec.status().as_deref(), Some("In progress"));
        assert_eq!(rec.remains(), 250);
        assert_eq!(rec.start_count(), 0);

        let broken: PanelStatusRecord = serde_json::from_value(json!({"error": "Incorrect order ID"})).unwrap();
        assert_eq!(broken.status(), None);
    }
}

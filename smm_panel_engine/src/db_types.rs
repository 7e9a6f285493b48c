use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use spg_common::Cents;
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType    ---------------------------------------------------------

/// The lifecycle of an order.
///
/// An order is created as `Pending` with the charge already debited. A successful hand-off to the upstream panel
/// moves it to `Submitted`; from there the reconciliation loop mirrors whatever the panel reports until the order
/// reaches a terminal state. `Refunded` and `Canceled` are absorbing: once an order lands in one of them, no
/// reconciliation cycle may change its status or move money for it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Charged locally, not yet accepted by the upstream panel.
    Pending,
    /// The panel has received the order and is preparing delivery.
    Processing,
    /// The panel accepted the order. A provider order id is usually on record.
    Submitted,
    /// The panel reports delivery as underway.
    InProgress,
    /// The panel reports the order as running. Also the optimistic default for unrecognised panel vocabulary.
    Active,
    /// Delivery finished in full.
    Completed,
    /// Delivery stopped short. The undelivered fraction of the charge is returned to the wallet.
    Partial,
    /// Canceled, either locally before submission or by the panel.
    Canceled,
    /// The panel rejected the order and the charge was reversed.
    Failed,
    /// The full charge has been returned to the wallet.
    Refunded,
}

impl OrderStatusType {
    /// The statuses the storefront groups under its single "active" filter.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            OrderStatusType::Pending
                | OrderStatusType::Processing
                | OrderStatusType::Submitted
                | OrderStatusType::InProgress
                | OrderStatusType::Active
        )
    }

    /// Terminal for the reconciliation loop. These states were reached through a refund or cancellation and
    /// must never be overwritten by a later panel report.
    pub fn is_terminal_for_sync(&self) -> bool {
        matches!(self, OrderStatusType::Refunded | OrderStatusType::Canceled)
    }

    /// Maps the status vocabulary used by upstream panels onto the local lifecycle. Panels disagree on spelling
    /// and spacing, so matching happens on a lowercased, trimmed token. Unrecognised values map to `Active`.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "completed" | "complete" => OrderStatusType::Completed,
            "pending" => OrderStatusType::Pending,
            "processing" => OrderStatusType::Processing,
            "inprogress" | "in progress" | "active" => OrderStatusType::Active,
            "canceled" | "cancelled" => OrderStatusType::Canceled,
            "partial" | "partially completed" => OrderStatusType::Partial,
            "failed" | "fail" => OrderStatusType::Failed,
            other => {
                debug!("🔁️ Unrecognised panel status '{other}'. Treating the order as active.");
                OrderStatusType::Active
            },
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Processing => "processing",
            OrderStatusType::Submitted => "submitted",
            OrderStatusType::InProgress => "in_progress",
            OrderStatusType::Active => "active",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Partial => "partial",
            OrderStatusType::Canceled => "canceled",
            OrderStatusType::Failed => "failed",
            OrderStatusType::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatusType::Pending),
            "processing" => Ok(OrderStatusType::Processing),
            "submitted" => Ok(OrderStatusType::Submitted),
            "in_progress" => Ok(OrderStatusType::InProgress),
            "active" => Ok(OrderStatusType::Active),
            "completed" => Ok(OrderStatusType::Completed),
            "partial" => Ok(OrderStatusType::Partial),
            "canceled" => Ok(OrderStatusType::Canceled),
            "failed" => Ok(OrderStatusType::Failed),
            "refunded" => Ok(OrderStatusType::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. Defaulting to active");
            OrderStatusType::Active
        })
    }
}

//--------------------------------------        Order         ---------------------------------------------------------

/// A persisted order row. `amount_cents` is immutable after creation; every refund raises `refunded_cents`
/// instead, which never exceeds `amount_cents`. Orders are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Composite catalog id, `source:sid`.
    pub service_id: String,
    pub quantity: i64,
    pub link: String,
    pub amount_cents: Cents,
    pub refunded_cents: Cents,
    pub status: OrderStatusType,
    /// The panel's order id, set when the order is submitted. Empty or absent orders cannot be reconciled.
    pub provider_order_id: Option<String>,
    /// The raw panel response (or error payload) as JSON text.
    pub provider_response: Option<String>,
    pub remains: i64,
    pub start_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The remaining refundable amount on this order.
    pub fn refundable(&self) -> Cents {
        self.amount_cents - self.refunded_cents
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order #{} ({} × {} for {}, {})",
            self.id, self.quantity, self.service_id, self.amount_cents, self.status
        )
    }
}

/// The insert payload for a new order. The status is always `pending` and the provider fields are filled in
/// after the panel call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub service_id: String,
    pub quantity: i64,
    pub link: String,
    pub amount_cents: Cents,
}

impl NewOrder {
    pub fn new(user_id: i64, service_id: String, quantity: i64, link: String, amount_cents: Cents) -> Self {
        Self { user_id, service_id, quantity, link, amount_cents }
    }
}

//--------------------------------------      UserWallet      ---------------------------------------------------------

/// A user's wallet. One row per user; the balance only ever changes inside a transaction that also writes an
/// order or ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserWallet {
    pub user_id: i64,
    pub balance: Cents,
    pub updated_at: DateTime<Utc>,
}

impl UserWallet {
    /// The wallet a user without a row effectively has.
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, balance: Cents::default(), updated_at: Utc::now() }
    }
}

//--------------------------------------     Ledger entry     ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LedgerEntryType {
    Credit,
    Debit,
}

impl Display for LedgerEntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryType::Credit => write!(f, "credit"),
            LedgerEntryType::Debit => write!(f, "debit"),
        }
    }
}

/// An append-only audit row. Every wallet mutation writes exactly one of these in the same transaction; rows
/// are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub amount_cents: Cents,
    pub entry_type: LedgerEntryType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: i64,
    pub amount_cents: Cents,
    pub entry_type: LedgerEntryType,
    pub description: String,
}

impl NewLedgerEntry {
    pub fn credit(user_id: i64, amount_cents: Cents, description: String) -> Self {
        Self { user_id, amount_cents, entry_type: LedgerEntryType::Credit, description }
    }

    pub fn debit(user_id: i64, amount_cents: Cents, description: String) -> Self {
        Self { user_id, amount_cents, entry_type: LedgerEntryType::Debit, description }
    }
}

//--------------------------------------   ServiceOverride    ---------------------------------------------------------

/// Locally curated adjustments for one upstream service, keyed by the provider's service id. All fields other
/// than the display strings, multiplier, hidden flag and purchase counter are optional; absent means "inherit
/// whatever the provider says".
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ServiceOverride {
    pub source_service_id: String,
    /// Empty string means "no override".
    pub display_name: String,
    pub display_description: String,
    /// Applied to the USD rate when positive. Zero or negative inherits the provider rate unchanged.
    pub rate_multiplier: f64,
    pub is_hidden: bool,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub provider_category: Option<String>,
    pub purchase_count: i64,
    pub display_id: Option<String>,
    pub refill: Option<bool>,
    pub cancel: Option<bool>,
    pub dripfeed: Option<bool>,
    /// Overrides the classified service type when non-empty and not the sentinel `"default"`.
    pub service_type: Option<String>,
    pub targeting: Option<String>,
    pub quality: Option<String>,
    pub stability: Option<String>,
}

impl ServiceOverride {
    pub fn hidden(source_service_id: &str) -> Self {
        Self { source_service_id: source_service_id.to_string(), is_hidden: true, ..Self::default() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_display_and_fromstr() {
        let all = [
            OrderStatusType::Pending,
            OrderStatusType::Processing,
            OrderStatusType::Submitted,
            OrderStatusType::InProgress,
            OrderStatusType::Active,
            OrderStatusType::Completed,
            OrderStatusType::Partial,
            OrderStatusType::Canceled,
            OrderStatusType::Failed,
            OrderStatusType::Refunded,
        ];
        for status in all {
            let text = status.to_string();
            assert_eq!(text.parse::<OrderStatusType>().unwrap(), status, "{text} did not round trip");
        }
        assert!("paused".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn provider_vocabulary_maps_onto_local_statuses() {
        assert_eq!(OrderStatusType::from_provider("Completed"), OrderStatusType::Completed);
        assert_eq!(OrderStatusType::from_provider("complete"), OrderStatusType::Completed);
        assert_eq!(OrderStatusType::from_provider("pending"), OrderStatusType::Pending);
        assert_eq!(OrderStatusType::from_provider("Processing"), OrderStatusType::Processing);
        assert_eq!(OrderStatusType::from_provider("In progress"), OrderStatusType::Active);
        assert_eq!(OrderStatusType::from_provider("InProgress"), OrderStatusType::Active);
        assert_eq!(OrderStatusType::from_provider("active"), OrderStatusType::Active);
        assert_eq!(OrderStatusType::from_provider("Cancelled"), OrderStatusType::Canceled);
        assert_eq!(OrderStatusType::from_provider("canceled"), OrderStatusType::Canceled);
        assert_eq!(OrderStatusType::from_provider("Partially Completed"), OrderStatusType::Partial);
        assert_eq!(OrderStatusType::from_provider("partial"), OrderStatusType::Partial);
        assert_eq!(OrderStatusType::from_provider("fail"), OrderStatusType::Failed);
        assert_eq!(OrderStatusType::from_provider(" failed "), OrderStatusType::Failed);
    }

    #[test]
    fn unknown_provider_status_defaults_to_active() {
        assert_eq!(OrderStatusType::from_provider("Awaiting moderation"), OrderStatusType::Active);
        assert_eq!(OrderStatusType::from_provider(""), OrderStatusType::Active);
    }

    #[test]
    fn in_flight_covers_exactly_the_ui_active_group() {
        let in_flight = [
            OrderStatusType::Pending,
            OrderStatusType::Processing,
            OrderStatusType::Submitted,
            OrderStatusType::InProgress,
            OrderStatusType::Active,
        ];
        for s in in_flight {
            assert!(s.is_in_flight());
            assert!(!s.is_terminal_for_sync());
        }
        assert!(OrderStatusType::Refunded.is_terminal_for_sync());
        assert!(OrderStatusType::Canceled.is_terminal_for_sync());
        assert!(!OrderStatusType::Completed.is_terminal_for_sync());
        assert!(!OrderStatusType::Failed.is_terminal_for_sync());
    }

    #[test]
    fn refundable_is_the_unrefunded_remainder() {
        let order = Order {
            id: 1,
            user_id: 1,
            service_id: "panel:55".into(),
            quantity: 1000,
            link: "https://example.com/p/1".into(),
            amount_cents: Cents::from(10_000),
            refunded_cents: Cents::from(2_500),
            status: OrderStatusType::Partial,
            provider_order_id: Some("9001".into()),
            provider_response: None,
            remains: 250,
            start_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.refundable(), Cents::from(7_500));
    }
}

use serde::{Deserialize, Serialize};
use spg_common::Cents;

use crate::db_types::{Order, OrderStatusType};

/// One panel status report, mapped onto the local vocabulary, ready to be applied to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatusUpdate {
    pub order_id: i64,
    pub status: OrderStatusType,
    pub remains: i64,
    pub start_count: i64,
}

/// What applying a panel report to one order did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The order was already `refunded` or `canceled` and was left untouched.
    SkippedTerminal,
    /// Status and counters were updated; no money moved.
    Updated {
        old_status: OrderStatusType,
        new_status: OrderStatusType,
    },
    /// Status and counters were updated and part of the charge was returned to the wallet.
    Refunded {
        old_status: OrderStatusType,
        new_status: OrderStatusType,
        amount: Cents,
    },
}

/// Whether the panel hand-off record landed, or something else finalized the row first.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// The order moved from `pending` to `submitted` and now carries the panel's order id and response.
    Recorded(Order),
    /// The order left `pending` while the panel call was in flight, typically a user cancel that already paid
    /// the charge back. The row is returned as found; the panel-side order still needs cancelling.
    Superseded(Order),
}

impl SubmissionOutcome {
    pub fn into_order(self) -> Order {
        match self {
            SubmissionOutcome::Recorded(order) | SubmissionOutcome::Superseded(order) => order,
        }
    }
}

/// The result of a user cancelling an order that never reached the panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanceledOrder {
    pub order_id: i64,
    pub refunded: Cents,
    pub new_balance: Cents,
}

/// The result of an operator-driven refund.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualRefund {
    pub order_id: i64,
    pub user_id: i64,
    /// The amount credited by this call.
    pub refunded: Cents,
    /// The cumulative refund on the order after this call.
    pub total_refunded: Cents,
    pub new_status: OrderStatusType,
    pub provider_order_id: Option<String>,
}

impl ManualRefund {
    /// A full refund of a panel-submitted order should also try to stop delivery upstream.
    pub fn wants_remote_cancel(&self) -> Option<&str> {
        if self.new_status != OrderStatusType::Refunded {
            return None;
        }
        self.provider_order_id.as_deref().filter(|id| !id.is_empty())
    }
}

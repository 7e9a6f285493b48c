//! The order-placement coordinator.
//!
//! Placement is charge-first: the wallet is debited and the order row committed *before* the panel is
//! called, so a crash mid-flight leaves a recoverable `pending` order rather than an unpaid submission.
//! When the panel then refuses or cannot be reached, the flow compensates in a fresh transaction and the
//! caller still gets a well-formed result carrying the rejection text.

use std::fmt::Debug;

use log::*;
use spg_common::Cents;

use crate::{
    db_types::{NewOrder, Order},
    jobs::{SideJob, SideJobSender},
    spe_api::{
        catalog_api::CatalogApi,
        errors::OrderFlowError,
        fx_api::FxRateApi,
        order_objects::{NewOrderRequest, OrderQueryFilter, OrderSummary, PlacedOrder},
    },
    traits::{
        CanceledOrder,
        CatalogStore,
        LedgerDatabase,
        ManualRefund,
        PanelOrderRequest,
        PanelProvider,
        PanelSubmission,
        RateSource,
        SubmissionOutcome,
    },
};

/// Charge for an order, in wallet minor units. The USD rate is converted with the current FX quote,
/// truncated into whole cents, and floored at one cent so a rounding-to-zero order is never free.
pub fn price_order(rate_usd_per_1000: f64, fx_rate: f64, quantity: i64) -> Cents {
    let major = rate_usd_per_1000 * fx_rate * quantity as f64 / 1000.0;
    let cents = Cents::from_major_truncated(major);
    if cents.is_positive() {
        cents
    } else {
        Cents::from(1)
    }
}

pub struct OrderFlowApi<B, C, P, R> {
    db: B,
    catalog: CatalogApi<C, P, R>,
    fx: FxRateApi<R>,
    provider: P,
    jobs: SideJobSender,
}

impl<B, C, P, R> Debug for OrderFlowApi<B, C, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, C, P, R> OrderFlowApi<B, C, P, R>
where
    B: LedgerDatabase,
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    pub fn new(db: B, catalog: CatalogApi<C, P, R>, fx: FxRateApi<R>, provider: P, jobs: SideJobSender) -> Self {
        Self { db, catalog, fx, provider, jobs }
    }

    /// Places an order end to end: resolve, price, debit, submit, and compensate if the panel says no.
    ///
    /// Returns `Ok` for both outcomes of the panel hand-off; only a service that cannot be resolved, an
    /// insufficient balance or a storage failure surface as errors. See [`PlacedOrder`].
    pub async fn place_order(&self, user_id: i64, request: NewOrderRequest) -> Result<PlacedOrder, OrderFlowError> {
        let service = self
            .catalog
            .find_service(&request.service_id, &request.source_service_id)
            .await?
            .ok_or_else(|| OrderFlowError::ServiceNotFound(request.requested_id().to_string()))?;

        let fx_rate = self.fx.rate().await;
        let charge = price_order(service.rate_per_1000, fx_rate, request.quantity);
        let new_order = NewOrder::new(user_id, service.id.clone(), request.quantity, request.link.clone(), charge);
        let order = self.db.debit_and_create_order(new_order).await?;
        debug!("🚀️ Order #{} created. {charge} debited from user {user_id}", order.id);

        let panel_request = PanelOrderRequest {
            service: service.source_service_id.clone(),
            quantity: request.quantity,
            link: request.link,
        };
        // A transport or decode failure takes the same compensation path as an explicit rejection.
        let submission = match self.provider.submit_order(&panel_request).await {
            Ok(submission) => submission,
            Err(e) => PanelSubmission::rejected(&e.to_string()),
        };
        let PanelSubmission { provider_order_id, rejection, raw_response } = submission;

        if let Some(reason) = rejection {
            warn!("🚀️ Panel refused Order #{}: {reason}. Reversing the charge.", order.id);
            let order = self.db.compensate_failed_order(order.id, &reason).await?;
            return Ok(PlacedOrder::Rejected { order, error: reason });
        }

        let provider_order_id = provider_order_id.filter(|id| !id.is_empty());
        let outcome =
            self.db.mark_order_submitted(order.id, provider_order_id.as_deref(), &raw_response.to_string()).await?;
        let order = match outcome {
            SubmissionOutcome::Recorded(order) => order,
            // A user cancel won the row while the panel call was in flight. The charge is already paid back;
            // the panel-side order still needs stopping, off the request path.
            SubmissionOutcome::Superseded(order) => {
                warn!("🚀️ Order #{} was finalized as {} during the panel hand-off", order.id, order.status);
                if let Some(provider_order_id) = provider_order_id {
                    self.jobs.dispatch(SideJob::CancelRemote { order_id: order.id, provider_order_id });
                }
                let error = format!("Order #{} was {} before the panel hand-off completed", order.id, order.status);
                return Ok(PlacedOrder::Rejected { order, error });
            },
        };
        if provider_order_id.is_some() {
            self.jobs.dispatch(SideJob::RecordPurchase { source_service_id: service.source_service_id });
        }
        info!(
            "🚀️ Order #{} submitted to the panel as [{}]",
            order.id,
            order.provider_order_id.as_deref().unwrap_or("-")
        );
        Ok(PlacedOrder::Submitted { order, panel_response: raw_response })
    }

    /// A user's order history with curated display metadata, newest first.
    pub async fn orders_for_user(
        &self,
        user_id: i64,
        filter: OrderQueryFilter,
    ) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id, filter).await?;
        trace!("🚀️ {} orders fetched for user {user_id}", orders.len());
        Ok(orders)
    }

    /// Cancels one of the caller's own orders, provided it never reached the panel, and returns the charge to
    /// the wallet.
    pub async fn cancel_unsubmitted_order(&self, user_id: i64, order_id: i64) -> Result<CanceledOrder, OrderFlowError> {
        let canceled = self.db.cancel_unsubmitted_order(user_id, order_id).await?;
        info!("🚀️ Order #{order_id} canceled by user {user_id}. {} returned", canceled.refunded);
        Ok(canceled)
    }

    /// Operator-driven refund of part or all of an order's unrefunded remainder. A refund that fully pays the
    /// order out also asks the panel to stop delivery, off the request path.
    pub async fn manual_refund(&self, order_id: i64, amount: Option<Cents>) -> Result<ManualRefund, OrderFlowError> {
        let refund = self.db.manual_refund(order_id, amount).await?;
        info!(
            "🚀️ Order #{order_id} refunded {} ({} so far). Status is now {}",
            refund.refunded, refund.total_refunded, refund.new_status
        );
        if let Some(provider_order_id) = refund.wants_remote_cancel() {
            self.jobs.dispatch(SideJob::CancelRemote { order_id, provider_order_id: provider_order_id.to_string() });
        }
        Ok(refund)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

//--------------------------------------      Order pricing tests    --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn charges_truncate_to_whole_cents() {
        // 0.90 USD per 1000 at 83 INR/USD for 500 units: 37.35 INR exactly.
        assert_eq!(price_order(0.90, 83.0, 500), Cents::from(3_735));
        // 1.337 * 83 * 777 / 1000 = 86.23...; fractions of a paisa are dropped.
        assert_eq!(price_order(1.337, 83.0, 777), Cents::from(8_622));
    }

    #[test]
    fn rounding_to_zero_is_never_free() {
        assert_eq!(price_order(0.01, 1.0, 10), Cents::from(1));
        assert_eq!(price_order(0.0, 83.0, 100), Cents::from(1));
    }

    #[test]
    fn usd_wallets_skip_fx_scaling() {
        assert_eq!(price_order(2.50, 1.0, 1000), Cents::from(250));
    }
}

//! In-memory fakes for the engine's trait seams.
//!
//! Each fake mirrors the transactional semantics of the Postgres backend closely enough for behavior tests:
//! money moves atomically with the order row, terminal orders are skipped, and refunds are deltas against
//! the cumulative refund. Call counters on the provider/rate fakes let cache tests assert exactly how many
//! upstream calls a code path made.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use spg_common::Cents;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, ServiceOverride, UserWallet},
    order_objects::{OrderQueryFilter, OrderSummary},
    spe_api::sync_api::{refund_delta, refund_target},
    traits::{
        CanceledOrder,
        CatalogStore,
        CatalogStoreError,
        LedgerDatabase,
        LedgerDbError,
        ManualRefund,
        PanelOrderRequest,
        PanelProvider,
        PanelService,
        PanelSubmission,
        ProviderError,
        RateSource,
        RateSourceError,
        RemoteOrderStatus,
        RemoteStatusUpdate,
        SubmissionOutcome,
        SyncOutcome,
    },
};

//--------------------------------------      FakeLedger      ---------------------------------------------------------

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<i64, Cents>,
    orders: Vec<Order>,
    descriptions: Vec<String>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl FakeLedger {
    pub fn with_balance(user_id: i64, balance: Cents) -> Self {
        let ledger = Self::default();
        ledger.state.lock().unwrap().wallets.insert(user_id, balance);
        ledger
    }

    pub fn balance(&self, user_id: i64) -> Cents {
        self.state.lock().unwrap().wallets.get(&user_id).copied().unwrap_or_default()
    }

    pub fn order(&self, order_id: i64) -> Order {
        self.state.lock().unwrap().orders.iter().find(|o| o.id == order_id).cloned().expect("no such order")
    }

    pub fn latest_order_id(&self) -> i64 {
        self.state.lock().unwrap().next_id
    }

    pub fn ledger_descriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().descriptions.clone()
    }

    /// Seeds an already-submitted order, the shape the reconciler works on.
    pub fn seed_submitted_order(
        &self,
        user_id: i64,
        amount: Cents,
        quantity: i64,
        provider_order_id: &str,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.orders.push(Order {
            id,
            user_id,
            service_id: "panel:2493".into(),
            quantity,
            link: "https://example.com/p/1".into(),
            amount_cents: amount,
            refunded_cents: Cents::default(),
            status: OrderStatusType::Submitted,
            provider_order_id: Some(provider_order_id.to_string()),
            provider_response: None,
            remains: 0,
            start_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn set_status(&self, order_id: i64, status: OrderStatusType) {
        let mut state = self.state.lock().unwrap();
        let order = state.orders.iter_mut().find(|o| o.id == order_id).expect("no such order");
        order.status = status;
    }
}

impl LedgerDatabase for FakeLedger {
    fn url(&self) -> &str {
        "fake://ledger"
    }

    async fn fetch_wallet(&self, user_id: i64) -> Result<UserWallet, LedgerDbError> {
        let balance = self.balance(user_id);
        Ok(UserWallet { user_id, balance, updated_at: Utc::now() })
    }

    async fn debit_and_create_order(&self, order: NewOrder) -> Result<Order, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let available = state.wallets.get(&order.user_id).copied().unwrap_or_default();
        if available < order.amount_cents {
            return Err(LedgerDbError::InsufficientFunds { required: order.amount_cents, available });
        }
        state.wallets.insert(order.user_id, available - order.amount_cents);
        state.next_id += 1;
        let id = state.next_id;
        let order = Order {
            id,
            user_id: order.user_id,
            service_id: order.service_id,
            quantity: order.quantity,
            link: order.link,
            amount_cents: order.amount_cents,
            refunded_cents: Cents::default(),
            status: OrderStatusType::Pending,
            provider_order_id: None,
            provider_response: None,
            remains: 0,
            start_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.orders.push(order.clone());
        state.descriptions.push(format!("Charge for order #{id}"));
        Ok(order)
    }

    async fn mark_order_submitted(
        &self,
        order_id: i64,
        provider_order_id: Option<&str>,
        raw_response: &str,
    ) -> Result<SubmissionOutcome, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            return Ok(SubmissionOutcome::Superseded(order.clone()));
        }
        order.status = OrderStatusType::Submitted;
        order.provider_order_id = provider_order_id.map(String::from);
        order.provider_response = Some(raw_response.to_string());
        Ok(SubmissionOutcome::Recorded(order.clone()))
    }

    async fn compensate_failed_order(&self, order_id: i64, reason: &str) -> Result<Order, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        if state.orders[idx].status != OrderStatusType::Pending {
            return Ok(state.orders[idx].clone());
        }
        let refund = state.orders[idx].refundable();
        let user_id = state.orders[idx].user_id;
        if refund.is_positive() {
            let balance = state.wallets.get(&user_id).copied().unwrap_or_default();
            state.wallets.insert(user_id, balance + refund);
            state.descriptions.push(format!("Reversal of failed order #{order_id}: {reason}"));
        }
        let order = &mut state.orders[idx];
        order.status = OrderStatusType::Failed;
        order.provider_response = Some(reason.to_string());
        order.refunded_cents += refund;
        Ok(order.clone())
    }

    async fn fetch_orders_for_user(
        &self,
        user_id: i64,
        filter: OrderQueryFilter,
    ) -> Result<Vec<OrderSummary>, LedgerDbError> {
        let state = self.state.lock().unwrap();
        let mut orders = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .filter(|o| filter.status.as_ref().map(|s| s.contains(&o.status)).unwrap_or(true))
            .map(|o| OrderSummary {
                id: o.id,
                service_id: o.service_id.clone(),
                display_id: None,
                display_name: None,
                amount_cents: o.amount_cents,
                quantity: o.quantity,
                status: o.status,
                link: o.link.clone(),
                start_count: o.start_count,
                remains: o.remains,
                provider_order_id: o.provider_order_id.clone(),
                created_at: o.created_at,
            })
            .collect::<Vec<OrderSummary>>();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn fetch_sync_candidates(&self, lookback: Duration, limit: i64) -> Result<Vec<Order>, LedgerDbError> {
        let cutoff = Utc::now() - lookback;
        let state = self.state.lock().unwrap();
        let candidates = state
            .orders
            .iter()
            .filter(|o| o.provider_order_id.as_deref().map(|id| !id.is_empty()).unwrap_or(false))
            .filter(|o| o.created_at >= cutoff)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(candidates)
    }

    async fn apply_remote_status(&self, update: RemoteStatusUpdate) -> Result<SyncOutcome, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .orders
            .iter()
            .position(|o| o.id == update.order_id)
            .ok_or(LedgerDbError::OrderNotFound(update.order_id))?;
        if state.orders[idx].status.is_terminal_for_sync() {
            return Ok(SyncOutcome::SkippedTerminal);
        }
        let (old_status, amount, refunded, quantity, user_id) = {
            let o = &state.orders[idx];
            (o.status, o.amount_cents, o.refunded_cents, o.quantity, o.user_id)
        };
        let target = refund_target(update.status, amount, refunded, update.remains, quantity);
        let refund = refund_delta(target, amount, refunded);
        if refund.is_positive() {
            let balance = state.wallets.get(&user_id).copied().unwrap_or_default();
            state.wallets.insert(user_id, balance + refund);
            state
                .descriptions
                .push(format!("Auto-refund for provider status '{}' order #{}", update.status, update.order_id));
        }
        let order = &mut state.orders[idx];
        order.status = update.status;
        order.remains = update.remains;
        order.start_count = update.start_count;
        order.refunded_cents += refund;
        if refund.is_positive() {
            Ok(SyncOutcome::Refunded { old_status, new_status: update.status, amount: refund })
        } else {
            Ok(SyncOutcome::Updated { old_status, new_status: update.status })
        }
    }

    async fn cancel_unsubmitted_order(&self, user_id: i64, order_id: i64) -> Result<CanceledOrder, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .orders
            .iter()
            .position(|o| o.id == order_id && o.user_id == user_id)
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        if !state.orders[idx].status.is_in_flight() {
            return Err(LedgerDbError::OrderFinalized(order_id));
        }
        if state.orders[idx].provider_order_id.as_deref().map(|id| !id.is_empty()).unwrap_or(false) {
            return Err(LedgerDbError::OrderAlreadySubmitted(order_id));
        }
        let refund = state.orders[idx].refundable();
        let balance = state.wallets.get(&user_id).copied().unwrap_or_default() + refund;
        state.wallets.insert(user_id, balance);
        let order = &mut state.orders[idx];
        order.status = OrderStatusType::Canceled;
        order.refunded_cents += refund;
        Ok(CanceledOrder { order_id, refunded: refund, new_balance: balance })
    }

    async fn manual_refund(&self, order_id: i64, requested: Option<Cents>) -> Result<ManualRefund, LedgerDbError> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(LedgerDbError::OrderNotFound(order_id))?;
        let remaining = state.orders[idx].refundable();
        if !remaining.is_positive() {
            return Err(LedgerDbError::NothingToRefund(order_id));
        }
        let refund = requested.filter(|r| r.is_positive()).unwrap_or(remaining).min(remaining);
        let user_id = state.orders[idx].user_id;
        let balance = state.wallets.get(&user_id).copied().unwrap_or_default() + refund;
        state.wallets.insert(user_id, balance);
        let order = &mut state.orders[idx];
        order.refunded_cents += refund;
        if order.refunded_cents == order.amount_cents {
            order.status = OrderStatusType::Refunded;
        }
        Ok(ManualRefund {
            order_id,
            user_id,
            refunded: refund,
            total_refunded: order.refunded_cents,
            new_status: order.status,
            provider_order_id: order.provider_order_id.clone(),
        })
    }
}

//--------------------------------------      FakePanel       ---------------------------------------------------------

#[derive(Default)]
struct PanelState {
    services: Vec<PanelService>,
    statuses: HashMap<String, RemoteOrderStatus>,
    submit: Option<Result<PanelSubmission, ProviderError>>,
    cancel_during_submit: Option<(FakeLedger, i64)>,
    fail_catalog: bool,
    fail_statuses: bool,
    catalog_calls: usize,
    status_calls: usize,
    canceled: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakePanel {
    state: Arc<Mutex<PanelState>>,
}

impl FakePanel {
    pub fn with_services(services: Vec<PanelService>) -> Self {
        let panel = Self::default();
        panel.state.lock().unwrap().services = services;
        panel
    }

    pub fn set_services(&self, services: Vec<PanelService>) {
        self.state.lock().unwrap().services = services;
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.state.lock().unwrap().fail_catalog = fail;
    }

    pub fn fail_statuses(&self, fail: bool) {
        self.state.lock().unwrap().fail_statuses = fail;
    }

    pub fn accept_orders_with_id(&self, provider_order_id: &str) {
        self.state.lock().unwrap().submit =
            Some(Ok(PanelSubmission::accepted(provider_order_id, serde_json::json!({ "order": provider_order_id }))));
    }

    pub fn reject_orders(&self, reason: &str) {
        self.state.lock().unwrap().submit = Some(Ok(PanelSubmission::rejected(reason)));
    }

    pub fn break_order_submission(&self, reason: &str) {
        self.state.lock().unwrap().submit = Some(Err(ProviderError::Network(reason.to_string())));
    }

    /// Arms a one-shot race: the next `submit_order` call cancels the caller's newest order in `ledger`
    /// before answering, as a user cancel landing mid-hand-off would.
    pub fn cancel_next_order_during_submit(&self, ledger: &FakeLedger, user_id: i64) {
        self.state.lock().unwrap().cancel_during_submit = Some((ledger.clone(), user_id));
    }

    pub fn report_status(&self, provider_order_id: &str, status: &str, remains: i64, start_count: i64) {
        self.state.lock().unwrap().statuses.insert(
            provider_order_id.to_string(),
            RemoteOrderStatus { status: Some(status.to_string()), remains, start_count },
        );
    }

    pub fn catalog_calls(&self) -> usize {
        self.state.lock().unwrap().catalog_calls
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    pub fn canceled_orders(&self) -> Vec<String> {
        self.state.lock().unwrap().canceled.clone()
    }
}

impl PanelProvider for FakePanel {
    async fn fetch_catalog(&self) -> Result<Vec<PanelService>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.catalog_calls += 1;
        if state.fail_catalog {
            return Err(ProviderError::Network("panel unreachable".into()));
        }
        Ok(state.services.clone())
    }

    async fn submit_order(&self, _request: &PanelOrderRequest) -> Result<PanelSubmission, ProviderError> {
        let race = self.state.lock().unwrap().cancel_during_submit.take();
        if let Some((ledger, user_id)) = race {
            let order_id = ledger.latest_order_id();
            ledger.cancel_unsubmitted_order(user_id, order_id).await.expect("mid-submit cancel failed");
        }
        let state = self.state.lock().unwrap();
        match &state.submit {
            Some(Ok(submission)) => Ok(submission.clone()),
            Some(Err(ProviderError::Network(e))) => Err(ProviderError::Network(e.clone())),
            Some(Err(ProviderError::Payload(e))) => Err(ProviderError::Payload(e.clone())),
            None => Err(ProviderError::Network("no submission behavior configured".into())),
        }
    }

    async fn fetch_statuses(
        &self,
        provider_order_ids: &[String],
    ) -> Result<HashMap<String, RemoteOrderStatus>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        if state.fail_statuses {
            return Err(ProviderError::Network("panel unreachable".into()));
        }
        Ok(provider_order_ids
            .iter()
            .filter_map(|id| state.statuses.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    async fn cancel_order(&self, provider_order_id: &str) -> Result<serde_json::Value, ProviderError> {
        self.state.lock().unwrap().canceled.push(provider_order_id.to_string());
        Ok(serde_json::json!({ "cancel": 1 }))
    }
}

//--------------------------------------      FakeRates       ---------------------------------------------------------

#[derive(Default)]
struct RatesState {
    rate: Option<f64>,
    calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeRates {
    state: Arc<Mutex<RatesState>>,
}

impl FakeRates {
    pub fn quoting(rate: f64) -> Self {
        let rates = Self::default();
        rates.state.lock().unwrap().rate = Some(rate);
        rates
    }

    /// A source that always fails, for fallback tests.
    pub fn broken() -> Self {
        Self::default()
    }

    pub fn set_rate(&self, rate: Option<f64>) {
        self.state.lock().unwrap().rate = rate;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl RateSource for FakeRates {
    async fn usd_rate(&self, currency: &str) -> Result<f64, RateSourceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.rate.ok_or_else(|| RateSourceError::Network(format!("no {currency} quote available")))
    }
}

//--------------------------------------      FakeStore       ---------------------------------------------------------

#[derive(Default)]
struct StoreState {
    overrides: HashMap<String, ServiceOverride>,
    purchases: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn with_overrides(overrides: Vec<ServiceOverride>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().overrides =
            overrides.into_iter().map(|ov| (ov.source_service_id.clone(), ov)).collect();
        store
    }

    pub fn purchases(&self) -> Vec<String> {
        self.state.lock().unwrap().purchases.clone()
    }
}

impl CatalogStore for FakeStore {
    async fn fetch_service_overrides(&self) -> Result<HashMap<String, ServiceOverride>, CatalogStoreError> {
        Ok(self.state.lock().unwrap().overrides.clone())
    }

    async fn record_purchase(&self, source_service_id: &str) -> Result<(), CatalogStoreError> {
        self.state.lock().unwrap().purchases.push(source_service_id.to_string());
        Ok(())
    }
}

//--------------------------------------      Fixtures        ---------------------------------------------------------

/// The reference service used throughout the behavior tests.
pub fn reel_views(rate_per_1000: f64) -> PanelService {
    PanelService {
        sid: "2493".into(),
        name: "Instagram Reel Views [Fast]".into(),
        service_type: "Default".into(),
        category: "Views".into(),
        rate_per_1000,
        min: 100,
        max: 1_000_000,
        refill: false,
        cancel: true,
        dripfeed: false,
        average_time: Some(37),
        description: "Start 0-15 min".into(),
    }
}

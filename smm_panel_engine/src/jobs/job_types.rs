/// Work that runs off the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideJob {
    /// Bump the purchase counter for a service after a successful panel submission.
    RecordPurchase { source_service_id: String },
    /// Ask the panel to stop delivery after a full refund of a submitted order.
    CancelRemote { order_id: i64, provider_order_id: String },
}

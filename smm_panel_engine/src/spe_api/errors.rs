use spg_common::Cents;
use thiserror::Error;

use crate::traits::{CatalogStoreError, LedgerDbError, ProviderError};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Panel error: {0}")]
    ProviderError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ProviderError> for CatalogApiError {
    fn from(e: ProviderError) -> Self {
        CatalogApiError::ProviderError(e.to_string())
    }
}

impl From<CatalogStoreError> for CatalogApiError {
    fn from(e: CatalogStoreError) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Service {0} is not in the catalog")]
    ServiceNotFound(String),
    #[error("Could not load the service catalog: {0}")]
    CatalogUnavailable(String),
    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientFunds { required: Cents, available: Cents },
    #[error("The requested order (id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("Order #{0} is already finalized")]
    OrderFinalized(i64),
    #[error("Order #{0} has already been sent to the panel")]
    OrderAlreadySubmitted(i64),
    #[error("Order #{0} has no refundable balance left")]
    NothingToRefund(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerDbError> for OrderFlowError {
    fn from(e: LedgerDbError) -> Self {
        match e {
            LedgerDbError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            LedgerDbError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            LedgerDbError::OrderFinalized(id) => OrderFlowError::OrderFinalized(id),
            LedgerDbError::OrderAlreadySubmitted(id) => OrderFlowError::OrderAlreadySubmitted(id),
            LedgerDbError::NothingToRefund(id) => OrderFlowError::NothingToRefund(id),
            LedgerDbError::InsufficientFunds { required, available } => {
                OrderFlowError::InsufficientFunds { required, available }
            },
        }
    }
}

impl From<CatalogApiError> for OrderFlowError {
    fn from(e: CatalogApiError) -> Self {
        OrderFlowError::CatalogUnavailable(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncApiError {
    #[error("Panel error: {0}")]
    ProviderError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ProviderError> for SyncApiError {
    fn from(e: ProviderError) -> Self {
        SyncApiError::ProviderError(e.to_string())
    }
}

impl From<LedgerDbError> for SyncApiError {
    fn from(e: LedgerDbError) -> Self {
        SyncApiError::DatabaseError(e.to_string())
    }
}

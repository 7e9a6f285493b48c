use std::collections::HashMap;

use thiserror::Error;

use crate::db_types::ServiceOverride;

#[derive(Debug, Clone, Error)]
pub enum CatalogStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogStoreError {
    fn from(e: sqlx::Error) -> Self {
        CatalogStoreError::DatabaseError(e.to_string())
    }
}

/// Storage for the locally curated service overrides.
#[allow(async_fn_in_trait)]
pub trait CatalogStore: Clone {
    /// Loads every override in one query, keyed by the provider's service id. Called once per catalog refresh.
    async fn fetch_service_overrides(&self) -> Result<HashMap<String, ServiceOverride>, CatalogStoreError>;

    /// Bumps the purchase counter for a service, creating the override row if none exists. Runs on the
    /// side-job queue; a failure is logged and never retried.
    async fn record_purchase(&self, source_service_id: &str) -> Result<(), CatalogStoreError>;
}

use std::collections::HashMap;

use log::trace;
use sqlx::PgConnection;

use crate::db_types::ServiceOverride;

/// Loads every override in one query, keyed by the provider's service id. The catalog refresh calls this
/// once per refresh rather than once per service.
pub async fn fetch_all(conn: &mut PgConnection) -> Result<HashMap<String, ServiceOverride>, sqlx::Error> {
    let rows: Vec<ServiceOverride> = sqlx::query_as("SELECT * FROM service_overrides").fetch_all(conn).await?;
    trace!("🗃️ Loaded {} service overrides", rows.len());
    Ok(rows.into_iter().map(|ov| (ov.source_service_id.clone(), ov)).collect())
}

/// Bumps the purchase counter for one service, creating a bare override row if the service was never
/// curated.
pub async fn record_purchase(source_service_id: &str, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO service_overrides (source_service_id, purchase_count) VALUES ($1, 1)
            ON CONFLICT (source_service_id)
            DO UPDATE SET purchase_count = service_overrides.purchase_count + 1;
        "#,
    )
    .bind(source_service_id)
    .execute(conn)
    .await?;
    Ok(())
}

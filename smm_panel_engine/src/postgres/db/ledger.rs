use log::trace;
use sqlx::PgConnection;

use crate::db_types::{LedgerEntry, NewLedgerEntry};

/// Appends one audit row to the transaction ledger. Always called inside the same transaction as the wallet
/// mutation it records; ledger rows are never updated or deleted.
pub async fn insert_entry(entry: NewLedgerEntry, conn: &mut PgConnection) -> Result<LedgerEntry, sqlx::Error> {
    trace!("🗃️ Ledger {}: {} for user {}", entry.entry_type, entry.amount_cents, entry.user_id);
    let entry = sqlx::query_as(
        r#"
            INSERT INTO transactions (user_id, amount_cents, entry_type, description, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *;
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.amount_cents.value())
    .bind(entry.entry_type)
    .bind(entry.description)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

use log::trace;
use spg_common::Cents;
use sqlx::PgConnection;

use crate::db_types::UserWallet;

/// Fetches a user's wallet row, if one exists.
pub async fn fetch_wallet(user_id: i64, conn: &mut PgConnection) -> Result<Option<UserWallet>, sqlx::Error> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(wallet)
}

/// Fetches a user's wallet row under a row lock. Call this inside a transaction whenever the balance is
/// about to be mutated; the lock holds until the transaction ends.
pub async fn fetch_wallet_for_update(
    user_id: i64,
    conn: &mut PgConnection,
) -> Result<Option<UserWallet>, sqlx::Error> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(wallet)
}

/// Subtracts `amount` from the wallet balance. The caller has already verified the balance under a lock in
/// the same transaction; a missing row here means the check was skipped and the statement affects nothing.
pub async fn debit(user_id: i64, amount: Cents, conn: &mut PgConnection) -> Result<Option<UserWallet>, sqlx::Error> {
    trace!("🗃️ Debiting {amount} from user {user_id}");
    let wallet = sqlx::query_as(
        "UPDATE wallets SET balance = balance - $2, updated_at = NOW() WHERE user_id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(amount.value())
    .fetch_optional(conn)
    .await?;
    Ok(wallet)
}

/// Adds `amount` to the wallet balance, creating the wallet row if the user never had one. Refunds must
/// succeed even for users whose wallet row was never created.
pub async fn upsert_credit(user_id: i64, amount: Cents, conn: &mut PgConnection) -> Result<UserWallet, sqlx::Error> {
    trace!("🗃️ Crediting {amount} to user {user_id}");
    let wallet = sqlx::query_as(
        r#"
            INSERT INTO wallets (user_id, balance, updated_at) VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET balance = wallets.balance + EXCLUDED.balance, updated_at = NOW()
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(amount.value())
    .fetch_one(conn)
    .await?;
    Ok(wallet)
}

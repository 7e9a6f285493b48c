use chrono::{Duration, Utc};
use log::trace;
use spg_common::Cents;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    order_objects::{OrderQueryFilter, OrderSummary},
};

/// Inserts a new order as `pending`. Not atomic on its own; callers embed this in the transaction that also
/// debits the wallet, passing `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut PgConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, service_id, quantity, link, amount_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.service_id)
    .bind(order.quantity)
    .bind(order.link)
    .bind(order.amount_cents.value())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Re-reads one order under a row lock. Every mutation of an existing order starts here so that a user
/// cancel, a manual refund and the reconciler can never interleave on the same row.
pub async fn fetch_order_for_update(id: i64, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Records a successful panel hand-off: provider order id, raw response, status `submitted`. The status
/// guard makes the update a no-op when the row left `pending` during the panel call; a user cancel that
/// landed in that window must not be overwritten.
pub async fn mark_submitted(
    id: i64,
    provider_order_id: Option<&str>,
    raw_response: &str,
    conn: &mut PgConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = 'submitted', provider_order_id = $2, provider_response = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(provider_order_id)
    .bind(raw_response)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Marks an order `failed` with the panel's error text, counting the compensating credit against the
/// cumulative refund so no later path can pay the charge out again.
pub async fn record_failure(
    id: i64,
    reason: &str,
    refund: Cents,
    conn: &mut PgConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = 'failed', provider_response = $2, refunded_cents = refunded_cents + $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(refund.value())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Folds one panel status report into the row: status, delivery counters, and any refund delta paid out in
/// the same transaction.
pub async fn apply_remote_report(
    id: i64,
    status: OrderStatusType,
    remains: i64,
    start_count: i64,
    refund: Cents,
    conn: &mut PgConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $2, remains = $3, start_count = $4, refunded_cents = refunded_cents + $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(remains)
    .bind(start_count)
    .bind(refund.value())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Applies a refund credit: raises the cumulative refund and sets the given status.
pub async fn apply_refund(
    id: i64,
    refund: Cents,
    status: OrderStatusType,
    conn: &mut PgConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $2, refunded_cents = refunded_cents + $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(refund.value())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// The reconciler's candidate scan: orders with a non-empty provider order id, created within `lookback`,
/// oldest update first, capped at `limit`. No status filter — terminal rows are cheap to skip under the row
/// lock, and polling recently finalized orders is what catches provider-side corrections.
pub async fn fetch_sync_candidates(
    lookback: Duration,
    limit: i64,
    conn: &mut PgConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let cutoff = Utc::now() - lookback;
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE provider_order_id IS NOT NULL AND provider_order_id <> '' AND created_at >= $1
            ORDER BY updated_at ASC
            LIMIT $2;
        "#,
    )
    .bind(cutoff)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Fetches a user's orders joined with their curated display metadata, newest first. The display id falls
/// back to `#<sid>` when no override names one.
pub async fn search_orders_for_user(
    user_id: i64,
    filter: OrderQueryFilter,
    conn: &mut PgConnection,
) -> Result<Vec<OrderSummary>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
    SELECT
        o.id,
        o.service_id,
        COALESCE(NULLIF(so.display_id, ''), '#' || split_part(o.service_id, ':', 2)) AS display_id,
        NULLIF(so.display_name, '') AS display_name,
        o.amount_cents,
        o.quantity,
        o.status,
        o.link,
        o.start_count,
        o.remains,
        o.provider_order_id,
        o.created_at
    FROM orders o
    LEFT JOIN service_overrides so ON so.source_service_id = split_part(o.service_id, ':', 2)
    WHERE o.user_id =
    "#,
    );
    builder.push_bind(user_id);
    if let Some(statuses) = filter.status.as_ref().filter(|s| !s.is_empty()) {
        builder.push(" AND o.status IN (");
        let mut separated = builder.separated(", ");
        for status in statuses {
            separated.push_bind(*status);
        }
        separated.push_unseparated(")");
    }
    if let Some(since) = filter.since {
        builder.push(" AND o.created_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = filter.until {
        builder.push(" AND o.created_at <= ");
        builder.push_bind(until);
    }
    builder.push(" ORDER BY o.created_at DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<OrderSummary>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders_for_user: {} rows", orders.len());
    Ok(orders)
}

//! # Postgres database methods
//!
//! This module contains "low-level" Postgres database interactions, one submodule per table.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut PgConnection` argument. Callers can obtain a connection from a pool, or create an atomic
//! transaction as the need arises and call through to the functions without any other changes. Row locks
//! (`SELECT … FOR UPDATE`) only hold until the enclosing transaction commits or rolls back.
use std::env;

use log::info;
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

pub mod ledger;
pub mod orders;
pub mod service_overrides;
pub mod wallets;

const PG_DB_URL: &str = "postgres://localhost/spg_store";

pub fn db_url() -> String {
    let result = env::var("SPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("SPG_DATABASE_URL is not set. Using the default.");
        PG_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

//! Postgres storage module for the SMM panel engine.

mod pg_impl;

pub mod db;
pub use pg_impl::PostgresDatabase;

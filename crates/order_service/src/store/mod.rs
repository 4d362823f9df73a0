//! Durable order storage.
//!
//! [`OrderStore`] is the seam between the order service and the relational
//! database. `postgres` is the production backend; `memory` keeps everything
//! in process for local development and tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use normalizer::Order;
use std::collections::HashMap;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create tables if needed. Safe to call repeatedly.
    async fn ensure_schema(&self) -> StoreResult<()>;

    /// Upsert an order with its delivery, payment and items atomically.
    ///
    /// `raw` is persisted as the order's stored payload. Items are replaced
    /// wholesale on every call.
    async fn save_order(&self, order: &Order, raw: &[u8]) -> StoreResult<()>;

    /// Stored payload for `order_uid`, or `None` if absent.
    async fn get_order(&self, order_uid: &str) -> StoreResult<Option<Bytes>>;

    /// Stored payloads of every order, keyed by `order_uid`.
    async fn get_all_orders(&self) -> StoreResult<HashMap<String, Bytes>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}

/// Parse `date_created` as RFC 3339, falling back to the current time.
///
/// A malformed timestamp never rejects an otherwise valid order.
pub fn parse_date_created(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

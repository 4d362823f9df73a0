//! In-memory implementation of the order store.
//!
//! Orders live in a `HashMap` guarded by `tokio::sync::RwLock`. Used for
//! local development when no database is configured, and by tests.
//!
//! Not durable: all state is lost on process restart. Each write replaces the
//! whole stored order, including its items, under one write lock, which gives
//! the same all-or-nothing visibility as the Postgres transaction.
//!
//! The store counts reads and writes and can be told to fail them, so tests
//! can observe whether the service touched storage.

use super::{OrderStore, StoreError, StoreResult};
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use normalizer::Order;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredOrder {
    order: Option<Order>,
    raw: Bytes,
}

/// Non-durable order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    orders: Arc<RwLock<HashMap<String, StoredOrder>>>,
    reads: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload without decoding it.
    ///
    /// Lets tests seed records that no longer normalize.
    pub async fn insert_raw(&self, order_uid: impl Into<String>, raw: impl Into<Bytes>) {
        self.orders.write().await.insert(
            order_uid.into(),
            StoredOrder {
                order: None,
                raw: raw.into(),
            },
        );
    }

    /// Decoded order last saved under `order_uid`.
    pub async fn stored_order(&self, order_uid: &str) -> Option<Order> {
        self.orders
            .read()
            .await
            .get(order_uid)
            .and_then(|stored| stored.order.clone())
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Number of point and bulk reads served.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful saves.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unexpected(anyhow!("read failure injected")));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn ensure_schema(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn save_order(&self, order: &Order, raw: &[u8]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unexpected(anyhow!("write failure injected")));
        }

        self.orders.write().await.insert(
            order.order_uid.clone(),
            StoredOrder {
                order: Some(order.clone()),
                raw: Bytes::copy_from_slice(raw),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> StoreResult<Option<Bytes>> {
        self.check_reads()?;
        Ok(self
            .orders
            .read()
            .await
            .get(order_uid)
            .map(|stored| stored.raw.clone()))
    }

    async fn get_all_orders(&self) -> StoreResult<HashMap<String, Bytes>> {
        self.check_reads()?;
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .map(|(id, stored)| (id.clone(), stored.raw.clone()))
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unexpected(anyhow!("read failure injected")));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

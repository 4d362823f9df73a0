//! Order service: ingestion, read-through lookup and cache warm-up.
//!
//! Storage is the source of truth. The cache only ever holds the canonical
//! form of orders that were durably committed or read back from storage.

use crate::cache::OrderCache;
use crate::error::Result;
use crate::store::OrderStore;
use bytes::Bytes;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates normalization, durable writes and the cache.
///
/// Cheap to clone; clones share the store and the cache.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: OrderCache,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, cache: OrderCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Load every stored order into the cache.
    ///
    /// Records that fail to normalize are logged and skipped. Returns the
    /// number of orders loaded.
    pub async fn warm_cache(&self) -> Result<usize> {
        let orders = self.store.get_all_orders().await?;
        let total = orders.len();

        let entries: Vec<(String, Bytes)> = orders
            .into_iter()
            .filter_map(|(id, raw)| match normalizer::normalize(&raw) {
                Ok(canonical) => Some((id, Bytes::from(canonical))),
                Err(e) => {
                    warn!("Skipping stored order {} during warm-up: {}", id, e);
                    counter!("order_service_warm_skipped_total").increment(1);
                    None
                }
            })
            .collect();

        let loaded = entries.len();
        self.cache.load_all(entries);

        info!("Cache warmed: {} of {} stored orders", loaded, total);
        Ok(loaded)
    }

    /// Process one inbound message.
    ///
    /// On success the order is committed to storage and then cached, and its
    /// `order_uid` is returned. Rejected payloads and storage failures leave
    /// both storage and cache untouched.
    pub async fn process_incoming(&self, payload: &[u8]) -> Result<String> {
        let (order, canonical) = normalizer::decode(payload)?;

        // The original payload is persisted; reads re-normalize it.
        self.store.save_order(&order, payload).await?;

        self.cache.set(order.order_uid.clone(), Bytes::from(canonical));
        debug!("Saved order {}", order.order_uid);
        Ok(order.order_uid)
    }

    /// Canonical bytes for `id`, or `None` if no such order exists.
    ///
    /// A cache miss falls back to storage and populates the cache, so the next
    /// lookup of the same id is served from memory. Absence is not cached.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Bytes>> {
        if let Some(data) = self.cache.get(id) {
            counter!("order_service_lookups_total", "source" => "cache").increment(1);
            return Ok(Some(data));
        }

        let Some(raw) = self.store.get_order(id).await? else {
            counter!("order_service_lookups_total", "source" => "missing").increment(1);
            return Ok(None);
        };

        let canonical = Bytes::from(normalizer::normalize(&raw)?);
        self.cache.set(id, canonical.clone());
        counter!("order_service_lookups_total", "source" => "store").increment(1);
        Ok(Some(canonical))
    }
}

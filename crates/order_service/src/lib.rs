//! Order service library.
//!
//! Ingests orders from a JetStream subject, persists them to Postgres and
//! serves them over HTTP through a read-through in-memory cache.
//!
//! # Architecture
//!
//! ```text
//! NATS --> IngestionListener --> OrderService::process_incoming --> OrderStore --> OrderCache
//! HTTP --> api --> OrderService::get_by_id --> OrderCache (hit) | OrderStore + OrderCache (miss)
//! startup --> OrderService::warm_cache --> OrderStore::get_all_orders --> OrderCache
//! ```
//!
//! # Example
//!
//! ```ignore
//! use order_service::{OrderCache, OrderService, InMemoryStore};
//! use std::sync::Arc;
//!
//! let service = OrderService::new(Arc::new(InMemoryStore::new()), OrderCache::new());
//! service.warm_cache().await?;
//!
//! let order_uid = service.process_incoming(payload).await?;
//! let canonical = service.get_by_id(&order_uid).await?;
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod listener;
pub mod service;
pub mod store;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, OrderCache};
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use listener::{Disposition, IngestionListener, ListenerConfig};
pub use service::OrderService;
pub use store::{InMemoryStore, OrderStore, PostgresConfig, PostgresStore, StoreError};

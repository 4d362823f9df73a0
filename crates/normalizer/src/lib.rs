//! Order record normalizer.
//!
//! Turns raw order payloads received from the stream into a stable canonical
//! JSON representation shared by storage reads, the cache and the HTTP API.
//!
//! # Architecture
//!
//! ```text
//! raw bytes --> schema::Order --> dto::OrderDto --> canonical bytes
//!               (lenient decode)   (fixed field order)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use normalizer::{decode, normalize};
//!
//! let (order, canonical) = decode(payload)?;
//! assert_eq!(normalize(&canonical)?, canonical);
//! ```

pub mod dto;
pub mod error;
pub mod normalize;
pub mod schema;

pub use dto::{DeliveryDto, ItemDto, OrderDto, PaymentDto};
pub use error::{NormalizeError, Result};
pub use normalize::{canonicalize, decode, normalize};
pub use schema::{Delivery, Item, Order, Payment};

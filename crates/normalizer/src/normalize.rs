//! Decoding of raw order payloads into the canonical representation.

use crate::dto::OrderDto;
use crate::error::{NormalizeError, Result};
use crate::schema::Order;

/// Decode a raw payload and produce its canonical bytes.
///
/// Fails with [`NormalizeError::InvalidFormat`] if the payload does not parse
/// as an order, and with [`NormalizeError::MissingIdentifier`] if `order_uid`
/// is empty.
pub fn decode(raw: &[u8]) -> Result<(Order, Vec<u8>)> {
    let order: Order = serde_json::from_slice(raw)?;
    if order.order_uid.is_empty() {
        return Err(NormalizeError::MissingIdentifier);
    }

    let canonical = canonicalize(&order)?;
    Ok((order, canonical))
}

/// Canonical bytes for a raw payload.
///
/// Idempotent: feeding the output back in yields the same bytes.
pub fn normalize(raw: &[u8]) -> Result<Vec<u8>> {
    decode(raw).map(|(_, canonical)| canonical)
}

/// Serialize an already-decoded order into its canonical form.
pub fn canonicalize(order: &Order) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&OrderDto::from(order))?)
}

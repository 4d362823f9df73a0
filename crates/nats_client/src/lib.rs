//! Thin wrapper over `async-nats` used by the order service and the publisher.

mod client;

pub use client::{
    ConsumerConfig, NatsClient, StreamConfig, DEFAULT_MAX_ACK_PENDING, DEFAULT_MAX_BYTES,
    DEFAULT_MAX_MESSAGES, DEFAULT_RETENTION_SECS,
};

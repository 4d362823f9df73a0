//! NATS client implementation with JetStream support.

use anyhow::Result;
use async_nats::jetstream::consumer::{pull, AckPolicy, DeliverPolicy, PullConsumer};
use async_nats::jetstream::{self, stream::Stream};
use async_nats::{Client, ConnectOptions};
use std::time::Duration;
use tracing::info;

/// Default retention period for streams (7 days).
pub const DEFAULT_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default max messages per stream.
pub const DEFAULT_MAX_MESSAGES: i64 = 1_000_000;

/// Default max bytes per stream (1GB).
pub const DEFAULT_MAX_BYTES: i64 = 1_073_741_824;

/// Default number of unacknowledged messages a durable consumer may hold.
pub const DEFAULT_MAX_ACK_PENDING: i64 = 25;

/// Configuration for creating a stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stream name.
    pub name: String,
    /// Subject patterns to capture.
    pub subjects: Vec<String>,
    /// Retention period in seconds.
    pub max_age_secs: u64,
    /// Maximum number of messages.
    pub max_messages: i64,
    /// Maximum bytes.
    pub max_bytes: i64,
}

impl StreamConfig {
    /// Create a stream config capturing a single subject.
    pub fn for_subject(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: vec![subject.into()],
            max_age_secs: DEFAULT_RETENTION_SECS,
            max_messages: DEFAULT_MAX_MESSAGES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Set retention period in seconds.
    pub fn with_retention(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }
}

/// Configuration for a durable pull consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Durable name; the server keeps the delivery position under it across restarts.
    pub durable_name: String,
    /// Subject filter within the stream.
    pub filter_subject: String,
    /// Upper bound on delivered-but-unacknowledged messages.
    pub max_ack_pending: i64,
}

impl ConsumerConfig {
    pub fn new(durable_name: impl Into<String>, filter_subject: impl Into<String>) -> Self {
        Self {
            durable_name: durable_name.into(),
            filter_subject: filter_subject.into(),
            max_ack_pending: DEFAULT_MAX_ACK_PENDING,
        }
    }

    pub fn with_max_ack_pending(mut self, max_ack_pending: i64) -> Self {
        self.max_ack_pending = max_ack_pending;
        self
    }
}

/// Wrapper around the NATS client with JetStream context.
#[derive(Clone)]
pub struct NatsClient {
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Connect to a NATS server and create a JetStream context.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);
        let client = async_nats::connect(url).await?;
        Ok(Self::from_client(client))
    }

    /// Connect with an explicit client name (visible in server monitoring).
    pub async fn connect_with_name(url: &str, name: &str) -> Result<Self> {
        info!("Connecting to NATS at {} as '{}'", url, name);
        let client = ConnectOptions::new().name(name).connect(url).await?;
        Ok(Self::from_client(client))
    }

    fn from_client(client: Client) -> Self {
        Self {
            jetstream: jetstream::new(client),
        }
    }

    /// Create or get a stream with the given configuration.
    pub async fn ensure_stream_with_config(&self, config: &StreamConfig) -> Result<Stream> {
        info!(
            "Ensuring stream '{}' exists (subjects: {:?}, retention: {}s)",
            config.name, config.subjects, config.max_age_secs
        );

        let stream = self
            .jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: config.name.clone(),
                subjects: config.subjects.clone(),
                retention: jetstream::stream::RetentionPolicy::Limits,
                max_messages: config.max_messages,
                max_bytes: config.max_bytes,
                max_age: Duration::from_secs(config.max_age_secs),
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await?;

        info!("Stream '{}' ready", config.name);
        Ok(stream)
    }

    /// Create or get a durable pull consumer on `stream`.
    ///
    /// New consumers start from the first message in the stream and require
    /// explicit acknowledgement of every message.
    pub async fn ensure_durable_consumer(
        &self,
        stream: &Stream,
        config: &ConsumerConfig,
    ) -> Result<PullConsumer> {
        info!(
            "Ensuring durable consumer '{}' (filter: {}, max_ack_pending: {})",
            config.durable_name, config.filter_subject, config.max_ack_pending
        );

        let consumer = stream
            .get_or_create_consumer(
                &config.durable_name,
                pull::Config {
                    durable_name: Some(config.durable_name.clone()),
                    filter_subject: config.filter_subject.clone(),
                    deliver_policy: DeliverPolicy::All,
                    ack_policy: AckPolicy::Explicit,
                    max_ack_pending: config.max_ack_pending,
                    ..Default::default()
                },
            )
            .await?;

        Ok(consumer)
    }

    /// Publish a message to JetStream (with acknowledgment).
    pub async fn publish(&self, subject: impl Into<String>, payload: bytes::Bytes) -> Result<()> {
        self.jetstream
            .publish(subject.into(), payload)
            .await?
            .await?;
        Ok(())
    }
}

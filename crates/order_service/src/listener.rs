//! JetStream ingestion loop feeding the order service.

use crate::error::Result as ServiceResult;
use crate::service::OrderService;
use anyhow::Result;
use async_nats::jetstream::{self, AckKind};
use futures::StreamExt;
use metrics::{counter, gauge};
use nats_client::{ConsumerConfig, NatsClient, StreamConfig, DEFAULT_RETENTION_SECS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Configuration for the ingestion listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// JetStream stream capturing the orders subject.
    pub stream_name: String,
    /// Subject orders are published to.
    pub subject: String,
    /// Durable consumer name; delivery position survives restarts.
    pub durable_name: String,
    /// Maximum messages processed concurrently (also the consumer's max_ack_pending).
    pub max_in_flight: usize,
    /// Stream retention in seconds.
    pub retention_secs: u64,
    /// Metrics update interval in seconds.
    pub metrics_interval_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            stream_name: "ORDERS".to_string(),
            subject: "orders".to_string(),
            durable_name: "orders-svc".to_string(),
            max_in_flight: 25,
            retention_secs: DEFAULT_RETENTION_SECS,
            metrics_interval_secs: 5,
        }
    }
}

/// Terminal state of one delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Durably stored and cached.
    Saved,
    /// Payload can never be processed (bad format or missing id).
    Rejected,
    /// Passed normalization but storage failed. Dropped without retry.
    Dropped,
}

impl Disposition {
    pub fn from_result(result: &ServiceResult<String>) -> Self {
        match result {
            Ok(_) => Disposition::Saved,
            Err(e) if e.is_rejection() => Disposition::Rejected,
            Err(_) => Disposition::Dropped,
        }
    }

    /// Acknowledgement sent back to JetStream.
    ///
    /// Rejected payloads are terminated so the server never redelivers them.
    pub fn ack_kind(self) -> AckKind {
        match self {
            Disposition::Saved | Disposition::Dropped => AckKind::Ack,
            Disposition::Rejected => AckKind::Term,
        }
    }

    fn as_label(self) -> &'static str {
        match self {
            Disposition::Saved => "saved",
            Disposition::Rejected => "rejected",
            Disposition::Dropped => "dropped",
        }
    }
}

/// Consumes the orders stream and drives [`OrderService::process_incoming`]
/// once per message.
pub struct IngestionListener {
    service: OrderService,
    nats_client: Arc<NatsClient>,
    config: ListenerConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl IngestionListener {
    pub fn new(
        service: OrderService,
        nats_client: NatsClient,
        config: ListenerConfig,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            service,
            nats_client: Arc::new(nats_client),
            config,
            shutdown_rx,
        }
    }

    /// Run until shutdown or until the subscription ends.
    ///
    /// Messages already handed to a worker are finished before returning.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Starting IngestionListener on '{}' (stream: {}, durable: {})",
            self.config.subject, self.config.stream_name, self.config.durable_name
        );

        let stream_config =
            StreamConfig::for_subject(&self.config.stream_name, &self.config.subject)
                .with_retention(self.config.retention_secs);
        let stream = self
            .nats_client
            .ensure_stream_with_config(&stream_config)
            .await?;

        let consumer_config =
            ConsumerConfig::new(&self.config.durable_name, &self.config.subject)
                .with_max_ack_pending(self.config.max_in_flight as i64);
        let consumer = self
            .nats_client
            .ensure_durable_consumer(&stream, &consumer_config)
            .await?;

        let mut messages = consumer.messages().await?;

        info!(
            "IngestionListener running (max in-flight: {})",
            self.config.max_in_flight
        );

        let in_flight = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut workers = JoinSet::new();

        let mut metrics_interval =
            tokio::time::interval(Duration::from_secs(self.config.metrics_interval_secs));

        loop {
            tokio::select! {
                biased;  // Prioritize shutdown signal

                _ = self.shutdown_rx.recv() => {
                    info!("IngestionListener received shutdown signal");
                    break;
                }

                _ = metrics_interval.tick() => {
                    self.update_metrics();
                }

                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        error!("Message worker failed: {:?}", e);
                    }
                }

                msg = messages.next() => {
                    match msg {
                        Some(Ok(message)) => {
                            counter!("order_service_messages_received_total").increment(1);

                            let permit = in_flight.clone().acquire_owned().await?;
                            let service = self.service.clone();
                            workers.spawn(async move {
                                handle_message(&service, message).await;
                                drop(permit);
                            });
                        }
                        Some(Err(e)) => {
                            warn!("Failed to receive message: {}", e);
                            counter!(
                                "order_service_errors_total",
                                "error_type" => "receive"
                            ).increment(1);
                        }
                        None => {
                            warn!("Subscription ended unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        if !workers.is_empty() {
            info!("Waiting for {} in-flight messages", workers.len());
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Message worker failed: {:?}", e);
            }
        }

        info!("IngestionListener stopped");
        Ok(())
    }

    /// Update Prometheus metrics.
    fn update_metrics(&self) {
        let stats = self.service.cache().stats();
        gauge!("order_service_cache_entries").set(stats.entries as f64);
        gauge!("order_service_cache_hits").set(stats.hits as f64);
        gauge!("order_service_cache_misses").set(stats.misses as f64);
    }
}

/// Process one delivery and acknowledge it.
async fn handle_message(service: &OrderService, message: jetstream::Message) {
    let result = service.process_incoming(&message.payload).await;
    let disposition = Disposition::from_result(&result);

    match &result {
        Ok(order_uid) => debug!("Saved order {}", order_uid),
        Err(e) if disposition == Disposition::Rejected => warn!("Skipping message: {}", e),
        Err(e) => error!("Dropping message after storage failure: {}", e),
    }

    counter!(
        "order_service_messages_processed_total",
        "outcome" => disposition.as_label()
    )
    .increment(1);

    if let Err(e) = message.ack_with(disposition.ack_kind()).await {
        warn!("Failed to acknowledge message: {}", e);
    }
}

//! Publishes one JSON order file to the orders subject.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use nats_client::{NatsClient, StreamConfig};
use rand::Rng;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "publisher")]
#[command(about = "Publish an order payload to JetStream")]
struct Args {
    /// Path to the JSON payload
    #[arg(short = 'f', long = "file", default_value = "model.json")]
    file: PathBuf,

    /// Subject to publish to
    #[arg(long, default_value = "orders")]
    subject: String,

    /// NATS server URL
    #[arg(long, default_value = "nats://localhost:4222")]
    url: String,

    /// Client name prefix; a random suffix is appended
    #[arg(long, default_value = "publisher")]
    client: String,

    /// Create this stream for the subject if it does not exist yet
    #[arg(long)]
    stream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let payload = std::fs::read(&args.file)
        .with_context(|| format!("read payload {}", args.file.display()))?;
    validate_json(&payload)?;

    let client_name = format!("{}-{}", args.client, rand::thread_rng().gen_range(0..1u32 << 31));
    let client = NatsClient::connect_with_name(&args.url, &client_name).await?;

    if let Some(stream) = &args.stream {
        client
            .ensure_stream_with_config(&StreamConfig::for_subject(stream, &args.subject))
            .await?;
    }

    let len = payload.len();
    client
        .publish(args.subject.clone(), Bytes::from(payload))
        .await
        .context("publish")?;

    info!(subject = %args.subject, bytes = len, "Published payload");
    Ok(())
}

fn validate_json(payload: &[u8]) -> Result<()> {
    serde_json::from_slice::<serde_json::Value>(payload)
        .context("file does not contain valid JSON")?;
    Ok(())
}

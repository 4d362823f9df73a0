//! Service configuration sourced from environment variables.

use crate::listener::ListenerConfig;
use crate::store::PostgresConfig;
use anyhow::{Context, Result};
use nats_client::DEFAULT_RETENTION_SECS;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";
pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_STATIC_DIR: &str = "./web/static";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `None` selects the in-memory store.
    pub postgres: Option<PostgresConfig>,
    pub nats_url: String,
    pub listener: ListenerConfig,
    pub http_bind: SocketAddr,
    pub metrics_port: u16,
    /// `None` disables static file serving.
    pub static_dir: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let postgres = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
                acquire_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
                )?),
            }),
            None => None,
        };

        let defaults = ListenerConfig::default();
        let listener = ListenerConfig {
            stream_name: lookup("NATS_STREAM").unwrap_or(defaults.stream_name),
            subject: lookup("NATS_SUBJECT").unwrap_or(defaults.subject),
            durable_name: lookup("NATS_DURABLE").unwrap_or(defaults.durable_name),
            max_in_flight: parse_or(&lookup, "MAX_IN_FLIGHT", defaults.max_in_flight)?,
            retention_secs: parse_or(&lookup, "NATS_RETENTION_SECS", DEFAULT_RETENTION_SECS)?,
            metrics_interval_secs: parse_or(
                &lookup,
                "METRICS_INTERVAL_SECS",
                defaults.metrics_interval_secs,
            )?,
        };
        if listener.max_in_flight == 0 {
            anyhow::bail!("MAX_IN_FLIGHT must be at least 1");
        }
        if listener.metrics_interval_secs == 0 {
            anyhow::bail!("METRICS_INTERVAL_SECS must be at least 1");
        }

        let static_dir = match lookup("STATIC_DIR") {
            Some(dir) if dir.is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        };

        Ok(Self {
            postgres,
            nats_url: lookup("NATS_URL").unwrap_or_else(|| DEFAULT_NATS_URL.to_string()),
            listener,
            http_bind: lookup("HTTP_BIND")
                .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string())
                .parse()
                .with_context(|| "parse HTTP_BIND")?,
            metrics_port: parse_or(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT)?,
            static_dir,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value.parse().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.postgres.is_none());
        assert_eq!(config.nats_url, DEFAULT_NATS_URL);
        assert_eq!(config.listener.subject, "orders");
        assert_eq!(config.listener.max_in_flight, 25);
        assert_eq!(config.http_bind.port(), 8080);
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert_eq!(config.static_dir, Some(PathBuf::from(DEFAULT_STATIC_DIR)));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://u:p@localhost/orders"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("NATS_SUBJECT", "orders.v2"),
            ("MAX_IN_FLIGHT", "4"),
            ("HTTP_BIND", "127.0.0.1:9000"),
            ("STATIC_DIR", ""),
        ])
        .unwrap();

        let postgres = config.postgres.unwrap();
        assert_eq!(postgres.max_connections, 3);
        assert_eq!(
            postgres.acquire_timeout,
            Duration::from_secs(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS)
        );
        assert_eq!(config.listener.subject, "orders.v2");
        assert_eq!(config.listener.max_in_flight, 4);
        assert_eq!(config.http_bind.to_string(), "127.0.0.1:9000");
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("MAX_IN_FLIGHT", "lots")]).is_err());
        assert!(config_from(&[("MAX_IN_FLIGHT", "0")]).is_err());
        assert!(config_from(&[("METRICS_INTERVAL_SECS", "0")]).is_err());
        assert!(config_from(&[("HTTP_BIND", "not-an-addr")]).is_err());
    }
}

use serde::Deserialize;
use std::net::SocketAddr;

use super::comments::CommentsConfig;
use super::ingest::IngestConfig;
use super::store::StoreConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:7100" or "127.0.0.1:8080"
    pub listen: SocketAddr,
    /// Counter store (Redis) connection settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Ingestion settings: fingerprint salt, locales, trending window
    pub ingest: IngestConfig,
    /// Comment intake settings: rate limits, moderation default
    #[serde(default)]
    pub comments: CommentsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Telemetry configuration
    /// Controls the metrics/health listener
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

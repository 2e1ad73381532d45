use serde::Deserialize;

/// Counter store connection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Redis connection URL
    /// Default: "redis://127.0.0.1:6379"
    #[serde(default = "default_url")]
    pub url: String,
    /// Connection timeout in milliseconds
    /// Timeouts are enforced here, at the store-client boundary; handlers
    /// never retry synchronously on top of them.
    /// Default: 250
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Number of reconnect attempts the connection manager makes
    /// Default: 1
    #[serde(default = "default_retries")]
    pub retries: usize,
    /// Retention window for day-scoped counters, in days
    /// Every day-bucketed key carries this TTL, refreshed on each write.
    /// Default: 40
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retries: default_retries(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    250
}

fn default_retries() -> usize {
    1
}

fn default_retention_days() -> u32 {
    40
}

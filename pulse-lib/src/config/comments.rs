use serde::Deserialize;

/// Comment intake configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CommentsConfig {
    /// Rate limiting applied per caller fingerprint
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Publish accepted comments immediately instead of queueing them
    /// for moderation
    /// Default: true
    #[serde(default = "default_true")]
    pub auto_publish: bool,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self { rate_limit: RateLimitConfig::default(), auto_publish: true }
    }
}

/// Fixed-window rate limit settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Maximum submissions per window
    /// Default: 10
    #[serde(default = "default_ceiling")]
    pub ceiling: u32,
    /// Window length in seconds
    /// Default: 600
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { ceiling: default_ceiling(), window_seconds: default_window_seconds() }
    }
}

fn default_ceiling() -> u32 {
    10
}

fn default_window_seconds() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

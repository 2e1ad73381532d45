use serde::Deserialize;

/// Ingestion gateway configuration
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Server-side salt mixed into every caller fingerprint.
    /// Required; validated non-empty at startup. Rotating it resets
    /// unique-visitor continuity for the current day buckets.
    pub salt: String,
    /// Locale used when a request carries an unknown or missing locale
    /// Default: "fi"
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Locales the platform publishes in
    /// Default: ["fi", "sv", "en"]
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    /// Rolling inactivity window for the per-locale trending sets, in hours
    /// The whole set expires this long after its last increment.
    /// Default: 24
    #[serde(default = "default_trending_ttl_hours")]
    pub trending_ttl_hours: u64,
    /// Record unique-visitor sketches alongside raw view counters
    /// Default: true
    #[serde(default = "default_true")]
    pub unique_visitors: bool,
}

fn default_locale() -> String {
    "fi".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["fi".to_string(), "sv".to_string(), "en".to_string()]
}

fn default_trending_ttl_hours() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

//! Key derivation and TTL policy for the counter store.
//!
//! Every key is owned by its time window: day-scoped keys carry the
//! retention TTL (refreshed on every write, since a prior partial failure
//! may have lost the original expiry), the trending sets carry a rolling
//! inactivity TTL, and the cumulative per-post counters carry none.
//! Reclamation is TTL expiry only; there is no delete path.
//!
//! The scope/metric/day triple is a stable interface: the rendering and
//! dashboard layers read these keys by name, so the strings produced here
//! must not change shape.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Scope of a counter key. Identifiers are taken as opaque, non-empty
/// strings owned by the content layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Site,
    Post(&'a str),
    Category { locale: &'a str, slug: &'a str },
    Country { locale: &'a str },
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Site => f.write_str("site"),
            Scope::Post(id) => write!(f, "post:{id}"),
            Scope::Category { locale, slug } => write!(f, "category:{locale}:{slug}"),
            Scope::Country { locale } => write!(f, "country:{locale}"),
        }
    }
}

/// Metric tracked under a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Views,
    ReadMs,
    UniqueVisitors,
}

impl Metric {
    fn as_str(self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::ReadMs => "readms",
            Metric::UniqueVisitors => "uv",
        }
    }
}

/// UTC day bucket in `YYYYMMDD` form.
pub fn day_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

/// Day bucket for the current instant.
pub fn today() -> String {
    day_bucket(Utc::now())
}

/// Derives counter-store keys and their TTLs.
#[derive(Debug, Clone)]
pub struct KeyScheme {
    retention: Duration,
    trending_ttl: Duration,
}

impl KeyScheme {
    pub fn new(retention_days: u32, trending_ttl_hours: u64) -> Self {
        Self {
            retention: Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60),
            trending_ttl: Duration::from_secs(trending_ttl_hours * 60 * 60),
        }
    }

    /// TTL carried by every day-scoped key.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Rolling TTL of the per-locale trending sets.
    pub fn trending_ttl(&self) -> Duration {
        self.trending_ttl
    }

    /// Day-windowed key: `{scope}:{metric}:{YYYYMMDD}`.
    pub fn daily(&self, scope: &Scope<'_>, metric: Metric, day: &str) -> String {
        format!("{scope}:{}:{day}", metric.as_str())
    }

    /// Cumulative (non-windowed) view total for one post.
    pub fn cumulative_views(&self, entity_id: &str) -> String {
        format!("post:{entity_id}:views:total")
    }

    /// Per-locale trending set key.
    pub fn trending(&self, locale: &str) -> String {
        format!("trend:{locale}")
    }

    /// Trending set member for one post.
    pub fn trending_member(entity_id: &str) -> String {
        format!("post:{entity_id}")
    }

    /// Fixed-window rate limit bucket for an endpoint class and caller key.
    pub fn rate_bucket(scope: &str, key: &str) -> String {
        format!("rl:{scope}:{key}")
    }
}

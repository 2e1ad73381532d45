//! Fixed-window rate limiting over the counter store.
//!
//! One counter bucket per (endpoint class, caller key). The bucket is
//! bumped on every check; the window starts when the bucket is created and
//! the count resets only when the bucket expires. This is a fixed window,
//! not a sliding one.
//!
//! Fail-open: when the store is unreachable the limiter allows the
//! request. The guarded endpoints favor availability over strict
//! throttling; this is a documented trade-off, not a bug.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::RateLimitConfig;
use crate::store::keys::KeyScheme;
use crate::store::CounterStore;
use crate::telemetry::Metrics;

pub struct FixedWindowLimiter<S> {
    store: Arc<S>,
    scope: String,
    ceiling: i64,
    window: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl<S: CounterStore> FixedWindowLimiter<S> {
    /// `scope` names the endpoint class and becomes part of the bucket key.
    pub fn new(
        store: Arc<S>,
        scope: impl Into<String>,
        config: &RateLimitConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            store,
            scope: scope.into(),
            ceiling: i64::from(config.ceiling),
            window: Duration::from_secs(config.window_seconds),
            metrics,
        }
    }

    /// Returns true when the caller may proceed. Rejected callers stay
    /// rejected for the remainder of the window.
    pub async fn allow(&self, key: &str) -> bool {
        let bucket = KeyScheme::rate_bucket(&self.scope, key);
        match self.store.bump(&bucket, self.window).await {
            Ok(count) => {
                let allowed = count <= self.ceiling;
                if let Some(m) = &self.metrics {
                    m.record_rate_limit(allowed);
                }
                allowed
            }
            Err(error) => {
                warn!(%error, scope = %self.scope, "rate limit check failed open");
                if let Some(m) = &self.metrics {
                    m.record_store_failure("rate_limit");
                }
                true
            }
        }
    }
}

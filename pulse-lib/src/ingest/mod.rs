//! Ingestion gateway: the pageview and read-time collectors.
//!
//! Both operations are stateless and fail-open: once shape validation
//! passes, the caller sees success regardless of whether the batched store
//! write went through. Losing a data point is preferred over failing the
//! client render path, and an outage therefore under-counts instead of
//! erroring. Writes for one event go out as a single ordered batch
//! (counters, then rankings, then sketches).

pub mod events;
pub mod fingerprint;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::config::IngestConfig;
use crate::store::keys::{day_bucket, KeyScheme, Metric, Scope};
use crate::store::{CounterStore, StoreOp, WriteBatch};
use crate::telemetry::Metrics;
use crate::{rankings, visitors};

use events::{clamp_read_time, ReadTimeEvent, ViewEvent};
use fingerprint::fingerprint;

/// The one caller-visible validation failure of the ingestion endpoints.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("entity id must not be empty")]
pub struct EmptyEntityId;

pub struct Gateway<S> {
    store: Arc<S>,
    keys: KeyScheme,
    config: IngestConfig,
    metrics: Option<Arc<Metrics>>,
}

impl<S: CounterStore> Gateway<S> {
    pub fn new(
        store: Arc<S>,
        config: IngestConfig,
        keys: KeyScheme,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self { store, keys, config, metrics }
    }

    /// Map a wire locale onto the supported set, falling back to the
    /// platform default for anything unrecognized.
    pub fn normalize_locale(&self, locale: Option<&str>) -> String {
        if let Some(locale) = locale {
            let locale = locale.trim().to_lowercase();
            if self.config.locales.iter().any(|l| *l == locale) {
                return locale;
            }
        }
        self.config.default_locale.clone()
    }

    /// Record one pageview.
    ///
    /// Fails only on an empty entity id. The derived fingerprint lives for
    /// the duration of this call and is not retained.
    pub async fn record_view(&self, event: ViewEvent) -> std::result::Result<(), EmptyEntityId> {
        let entity_id = event.entity_id.trim();
        if entity_id.is_empty() {
            return Err(EmptyEntityId);
        }

        let locale = self.normalize_locale(event.locale.as_deref());
        let day = day_bucket(Utc::now());
        let caller = self.caller_fingerprint(&event);

        let mut batch: WriteBatch = Vec::with_capacity(8);
        batch.push(StoreOp::Incr {
            key: self.keys.daily(&Scope::Site, Metric::Views, &day),
            delta: 1,
            ttl: Some(self.keys.retention()),
        });
        batch.push(StoreOp::Incr {
            key: self.keys.daily(&Scope::Post(entity_id), Metric::Views, &day),
            delta: 1,
            ttl: Some(self.keys.retention()),
        });
        batch.push(StoreOp::Incr {
            key: self.keys.cumulative_views(entity_id),
            delta: 1,
            ttl: None,
        });
        if let Some(slug) = normalized(event.category.as_deref()) {
            batch.push(StoreOp::Incr {
                key: self
                    .keys
                    .daily(&Scope::Category { locale: &locale, slug: &slug }, Metric::Views, &day),
                delta: 1,
                ttl: Some(self.keys.retention()),
            });
        }

        let country = event.country.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let country = country.map(str::to_uppercase);
        batch.extend(rankings::view_ops(
            &self.keys,
            &locale,
            entity_id,
            country.as_deref(),
            &day,
        ));

        if self.config.unique_visitors {
            if let Some(caller) = &caller {
                batch.extend(visitors::view_ops(&self.keys, entity_id, caller, &day));
            }
        }

        self.dispatch(batch, "view").await;
        if let Some(m) = &self.metrics {
            m.record_view(&locale);
        }
        Ok(())
    }

    /// Record accumulated read time from a client heartbeat.
    ///
    /// The reported value is clamped to `[0, 300000]`; a ping that clamps
    /// to zero returns success without touching the store.
    pub async fn record_read_time(
        &self,
        event: ReadTimeEvent,
    ) -> std::result::Result<(), EmptyEntityId> {
        let entity_id = event.entity_id.trim();
        if entity_id.is_empty() {
            return Err(EmptyEntityId);
        }

        let elapsed = clamp_read_time(event.elapsed_ms);
        if elapsed == 0 {
            return Ok(());
        }

        let locale = self.normalize_locale(event.locale.as_deref());
        let day = day_bucket(Utc::now());

        let mut batch: WriteBatch = vec![
            StoreOp::Incr {
                key: self.keys.daily(&Scope::Site, Metric::ReadMs, &day),
                delta: elapsed,
                ttl: Some(self.keys.retention()),
            },
            StoreOp::Incr {
                key: self.keys.daily(&Scope::Post(entity_id), Metric::ReadMs, &day),
                delta: elapsed,
                ttl: Some(self.keys.retention()),
            },
        ];
        if let Some(slug) = normalized(event.category.as_deref()) {
            batch.push(StoreOp::Incr {
                key: self
                    .keys
                    .daily(&Scope::Category { locale: &locale, slug: &slug }, Metric::ReadMs, &day),
                delta: elapsed,
                ttl: Some(self.keys.retention()),
            });
        }

        self.dispatch(batch, "read_time").await;
        if let Some(m) = &self.metrics {
            m.record_read_time(elapsed as u64);
        }
        Ok(())
    }

    /// Key scheme in use, for read-side consumers.
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    fn caller_fingerprint(&self, event: &ViewEvent) -> Option<String> {
        if let Some(addr) = event.caller_addr {
            return Some(fingerprint(&self.config.salt, &addr.to_string()));
        }
        // Session tokens are opaque; trimmed but not case-folded.
        event
            .sid
            .as_deref()
            .map(str::trim)
            .filter(|sid| !sid.is_empty())
            .map(|sid| fingerprint(&self.config.salt, sid))
    }

    async fn dispatch(&self, batch: WriteBatch, op: &'static str) {
        if let Err(error) = self.store.apply(batch).await {
            warn!(%error, op, "engagement batch dropped");
            if let Some(m) = &self.metrics {
                m.record_store_failure(op);
            }
        }
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_lowercase())
}

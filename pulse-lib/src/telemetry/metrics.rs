use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const STATUS_CODE: &str = "status_code";
    pub const LOCALE: &str = "locale";
    pub const OP: &str = "op";
    pub const REASON: &str = "reason";
    pub const VERSION: &str = "version";
}

#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    // Ingestion metrics
    pub views_total: Counter<u64>,
    pub read_time_ms_total: Counter<u64>,
    pub store_failures_total: Counter<u64>,

    // Rate limiting metrics
    pub rate_limit_allowed_total: Counter<u64>,
    pub rate_limit_rejected_total: Counter<u64>,

    // Comment intake metrics
    pub comments_accepted_total: Counter<u64>,
    pub comments_rejected_total: Counter<u64>,
    pub comments_ignored_total: Counter<u64>,

    // Build info
    pub build_info: Gauge<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("pulse_requests_total")
                .with_description("Total number of requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("pulse_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),

            views_total: meter
                .u64_counter("pulse_views_total")
                .with_description("Total pageviews ingested")
                .build(),
            read_time_ms_total: meter
                .u64_counter("pulse_read_time_ms_total")
                .with_description("Total read time ingested, in milliseconds")
                .build(),
            store_failures_total: meter
                .u64_counter("pulse_store_failures_total")
                .with_description("Counter store writes dropped after failure (fail-open)")
                .build(),

            rate_limit_allowed_total: meter
                .u64_counter("pulse_rate_limit_allowed_total")
                .with_description("Total number of requests allowed by the rate limiter")
                .build(),
            rate_limit_rejected_total: meter
                .u64_counter("pulse_rate_limit_rejected_total")
                .with_description("Total number of requests rejected by the rate limiter (429)")
                .build(),

            comments_accepted_total: meter
                .u64_counter("pulse_comments_accepted_total")
                .with_description("Comments accepted and persisted")
                .build(),
            comments_rejected_total: meter
                .u64_counter("pulse_comments_rejected_total")
                .with_description("Comments rejected, by reason")
                .build(),
            comments_ignored_total: meter
                .u64_counter("pulse_comments_ignored_total")
                .with_description("Honeypot submissions silently dropped")
                .build(),

            build_info: meter
                .u64_gauge("pulse_build_info")
                .with_description("Build information (version)")
                .build(),
        }
    }

    /// Set build info metric with the crate version label
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        self.build_info
            .record(1, &[KeyValue::new(labels::VERSION, version)]);
    }

    pub fn record_request(&self, endpoint: &'static str, status_code: u16, duration: f64) {
        let attrs = [
            KeyValue::new(labels::ENDPOINT, endpoint),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds
            .record(duration, &[KeyValue::new(labels::ENDPOINT, endpoint)]);
    }

    pub fn record_view(&self, locale: &str) {
        self.views_total
            .add(1, &[KeyValue::new(labels::LOCALE, locale.to_string())]);
    }

    pub fn record_read_time(&self, ms: u64) {
        if ms > 0 {
            self.read_time_ms_total.add(ms, &[]);
        }
    }

    pub fn record_store_failure(&self, op: &'static str) {
        self.store_failures_total
            .add(1, &[KeyValue::new(labels::OP, op)]);
    }

    pub fn record_rate_limit(&self, allowed: bool) {
        if allowed {
            self.rate_limit_allowed_total.add(1, &[]);
        } else {
            self.rate_limit_rejected_total.add(1, &[]);
        }
    }

    pub fn record_comment_accepted(&self) {
        self.comments_accepted_total.add(1, &[]);
    }

    pub fn record_comment_rejected(&self, reason: &'static str) {
        self.comments_rejected_total
            .add(1, &[KeyValue::new(labels::REASON, reason)]);
    }

    pub fn record_comment_ignored(&self) {
        self.comments_ignored_total.add(1, &[]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("pulse");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}

mod comments;
mod ingest;
mod loader;
mod root;
mod store;
mod telemetry;

pub use comments::{CommentsConfig, RateLimitConfig};
pub use ingest::IngestConfig;
pub use loader::load_from_path;
pub use root::Config;
pub use store::StoreConfig;
pub use telemetry::{LoggingConfig, TelemetryConfig};

#![forbid(unsafe_code)]

pub mod abuse;
pub mod comments;
pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod rankings;
pub mod store;
pub mod telemetry;
pub mod visitors;

pub use config::{load_from_path, Config};
pub use error::{CollectorError, Result};
pub use http::server::AppState;
pub use ingest::Gateway;
pub use store::keys::KeyScheme;
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore, StoreOp, WriteBatch};

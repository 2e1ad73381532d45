//! Counter store abstraction.
//!
//! The collector coordinates exclusively through store-side atomic
//! primitives: plain increments, sorted-set member increments, and
//! probabilistic-cardinality adds. No component ever reads a counter and
//! writes it back, so arbitrary interleaving across process instances is
//! safe. All writes for one logical event travel as a single ordered
//! [`WriteBatch`]; when the backend cannot pipeline, the fixed order
//! (counters, then rankings, then sketches) biases partial failures
//! toward undercounting rather than corrupted rankings.

pub mod keys;
mod memory;
mod redis;

pub use memory::MemoryCounterStore;
pub use self::redis::RedisCounterStore;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// One write against the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Plain counter increment; `ttl` refreshes the key's expiry when set.
    Incr {
        key: String,
        delta: i64,
        ttl: Option<Duration>,
    },
    /// Sorted-set member increment by 1, refreshing the whole set's expiry.
    RankIncr {
        key: String,
        member: String,
        ttl: Duration,
    },
    /// Probabilistic-cardinality add, refreshing the sketch's expiry.
    SketchAdd {
        key: String,
        element: String,
        ttl: Duration,
    },
}

/// Ordered writes for one logical event.
pub type WriteBatch = Vec<StoreOp>;

/// Backend providing the atomic primitives the collector relies on.
///
/// Implementations must keep each operation individually atomic; the batch
/// as a whole is explicitly not transactional.
pub trait CounterStore: Send + Sync + 'static {
    /// Apply one event's writes in order, as a single round trip where the
    /// backend supports pipelining.
    fn apply(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send;

    /// Fixed-window increment: bumps `key` by one and starts the window
    /// (sets the expiry) only when this was the first hit. Returns the
    /// post-increment count.
    fn bump(&self, key: &str, window: Duration) -> impl Future<Output = Result<i64>> + Send;

    /// Current value of a plain counter; missing keys read as 0.
    fn counter(&self, key: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Cardinality estimate of a probabilistic sketch; missing keys read
    /// as 0. The result is approximate by contract.
    fn estimate(&self, key: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Top `n` members of a sorted set, highest score first.
    fn top(&self, key: &str, n: usize)
        -> impl Future<Output = Result<Vec<(String, i64)>>> + Send;
}

//! In-memory counter store.
//!
//! A process-local stand-in for Redis used by the test suite and as a dev
//! backend. Expiry is evaluated lazily on access; "sketches" are exact
//! sets, so cardinality estimates carry zero error here. The store counts
//! every write it applies and can be switched into a failing mode, which
//! is how the fail-open paths are exercised.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ahash::{AHashMap, AHashSet};

use super::{CounterStore, StoreOp, WriteBatch};
use crate::error::{CollectorError, Result};

#[derive(Default)]
struct Tables {
    counters: AHashMap<String, i64>,
    ranks: AHashMap<String, AHashMap<String, i64>>,
    sketches: AHashMap<String, AHashSet<String>>,
    expiries: AHashMap<String, Instant>,
}

impl Tables {
    fn purge(&mut self, key: &str) {
        if let Some(deadline) = self.expiries.get(key).copied() {
            if deadline <= Instant::now() {
                self.expiries.remove(key);
                self.counters.remove(key);
                self.ranks.remove(key);
                self.sketches.remove(key);
            }
        }
    }

    fn refresh(&mut self, key: &str, ttl: Duration) {
        self.expiries.insert(key.to_string(), Instant::now() + ttl);
    }
}

#[derive(Default)]
pub struct MemoryCounterStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// When set, every store call fails until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(CollectorError::Store("injected store failure".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CollectorError::Store("store lock poisoned".to_string()))
    }

    fn apply_sync(&self, batch: WriteBatch) -> Result<()> {
        self.check_failing()?;
        let mut tables = self.lock()?;
        let ops = batch.len();
        for op in batch {
            match op {
                StoreOp::Incr { key, delta, ttl } => {
                    tables.purge(&key);
                    *tables.counters.entry(key.clone()).or_insert(0) += delta;
                    if let Some(ttl) = ttl {
                        tables.refresh(&key, ttl);
                    }
                }
                StoreOp::RankIncr { key, member, ttl } => {
                    tables.purge(&key);
                    *tables
                        .ranks
                        .entry(key.clone())
                        .or_default()
                        .entry(member)
                        .or_insert(0) += 1;
                    tables.refresh(&key, ttl);
                }
                StoreOp::SketchAdd { key, element, ttl } => {
                    tables.purge(&key);
                    tables.sketches.entry(key.clone()).or_default().insert(element);
                    tables.refresh(&key, ttl);
                }
            }
        }
        self.writes.fetch_add(ops, Ordering::Relaxed);
        Ok(())
    }

    fn bump_sync(&self, key: &str, window: Duration) -> Result<i64> {
        self.check_failing()?;
        let mut tables = self.lock()?;
        tables.purge(key);
        let count = tables.counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        if count == 1 {
            tables.refresh(key, window);
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(count)
    }

    fn counter_sync(&self, key: &str) -> Result<i64> {
        self.check_failing()?;
        let mut tables = self.lock()?;
        tables.purge(key);
        Ok(tables.counters.get(key).copied().unwrap_or(0))
    }

    fn estimate_sync(&self, key: &str) -> Result<i64> {
        self.check_failing()?;
        let mut tables = self.lock()?;
        tables.purge(key);
        Ok(tables.sketches.get(key).map_or(0, |s| s.len() as i64))
    }

    fn top_sync(&self, key: &str, n: usize) -> Result<Vec<(String, i64)>> {
        self.check_failing()?;
        let mut tables = self.lock()?;
        tables.purge(key);
        let mut entries: Vec<(String, i64)> = tables
            .ranks
            .get(key)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        Ok(entries)
    }
}

impl CounterStore for MemoryCounterStore {
    fn apply(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send {
        let result = self.apply_sync(batch);
        async move { result }
    }

    fn bump(&self, key: &str, window: Duration) -> impl Future<Output = Result<i64>> + Send {
        let result = self.bump_sync(key, window);
        async move { result }
    }

    fn counter(&self, key: &str) -> impl Future<Output = Result<i64>> + Send {
        let result = self.counter_sync(key);
        async move { result }
    }

    fn estimate(&self, key: &str) -> impl Future<Output = Result<i64>> + Send {
        let result = self.estimate_sync(key);
        async move { result }
    }

    fn top(
        &self,
        key: &str,
        n: usize,
    ) -> impl Future<Output = Result<Vec<(String, i64)>>> + Send {
        let result = self.top_sync(key, n);
        async move { result }
    }
}

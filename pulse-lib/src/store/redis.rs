//! Redis-backed counter store.
//!
//! One [`WriteBatch`] becomes one pipelined request: `INCRBY`, `ZINCRBY`
//! and `PFADD` with an `EXPIRE` colocated after every windowed write. TTL
//! refresh is idempotent, so re-setting it on each write costs nothing and
//! repairs any expiry lost to an earlier partial failure.

use std::future::Future;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;

use super::{CounterStore, StoreOp, WriteBatch};
use crate::config::StoreConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect with bounded retries and the configured connect timeout.
    pub async fn connect(cfg: &StoreConfig) -> Result<Self> {
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(cfg.retries)
            .set_connection_timeout(Duration::from_millis(cfg.connect_timeout_ms));

        let client = redis::Client::open(cfg.url.as_str())?;
        let connection = client
            .get_connection_manager_with_config(manager_config)
            .await?;

        Ok(Self { connection })
    }
}

fn ttl_secs(ttl: Duration) -> i64 {
    ttl.as_secs().max(1) as i64
}

impl CounterStore for RedisCounterStore {
    fn apply(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send {
        let mut conn = self.connection.clone();
        async move {
            if batch.is_empty() {
                return Ok(());
            }
            let mut pipe = redis::pipe();
            for op in &batch {
                match op {
                    StoreOp::Incr { key, delta, ttl } => {
                        pipe.incr(key, *delta).ignore();
                        if let Some(ttl) = ttl {
                            pipe.expire(key, ttl_secs(*ttl)).ignore();
                        }
                    }
                    StoreOp::RankIncr { key, member, ttl } => {
                        pipe.zincr(key, member, 1i64).ignore();
                        pipe.expire(key, ttl_secs(*ttl)).ignore();
                    }
                    StoreOp::SketchAdd { key, element, ttl } => {
                        pipe.pfadd(key, element).ignore();
                        pipe.expire(key, ttl_secs(*ttl)).ignore();
                    }
                }
            }
            let _: () = pipe.query_async(&mut conn).await?;
            Ok(())
        }
    }

    fn bump(&self, key: &str, window: Duration) -> impl Future<Output = Result<i64>> + Send {
        let mut conn = self.connection.clone();
        let key = key.to_string();
        async move {
            let count: i64 = conn.incr(&key, 1i64).await?;
            if count == 1 {
                let _: bool = conn.expire(&key, ttl_secs(window)).await?;
            }
            Ok(count)
        }
    }

    fn counter(&self, key: &str) -> impl Future<Output = Result<i64>> + Send {
        let mut conn = self.connection.clone();
        let key = key.to_string();
        async move {
            let value: Option<i64> = conn.get(&key).await?;
            Ok(value.unwrap_or(0))
        }
    }

    fn estimate(&self, key: &str) -> impl Future<Output = Result<i64>> + Send {
        let mut conn = self.connection.clone();
        let key = key.to_string();
        async move {
            let value: i64 = conn.pfcount(&key).await?;
            Ok(value)
        }
    }

    fn top(
        &self,
        key: &str,
        n: usize,
    ) -> impl Future<Output = Result<Vec<(String, i64)>>> + Send {
        let mut conn = self.connection.clone();
        let key = key.to_string();
        async move {
            if n == 0 {
                return Ok(Vec::new());
            }
            let stop = (n as isize) - 1;
            let entries: Vec<(String, i64)> = conn.zrevrange_withscores(&key, 0, stop).await?;
            Ok(entries)
        }
    }
}

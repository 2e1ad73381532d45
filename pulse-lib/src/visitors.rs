//! Unique-visitor estimation.
//!
//! Thin wrapper over the store's probabilistic-cardinality sets, one per
//! (scope, day). Within a day the estimate is monotonically non-decreasing
//! as distinct fingerprints arrive and is insensitive to re-adding the
//! same fingerprint; re-adds can move it only within the sketch's inherent
//! error bound (Redis HyperLogLog: ~0.81% standard error). Results are
//! estimates and must never be presented as exact counts. No raw
//! fingerprint is retained outside the sketch.

use crate::error::Result;
use crate::store::keys::{KeyScheme, Metric, Scope};
use crate::store::{CounterStore, StoreOp};

/// Sketch writes for one view: site-wide and per-post adds.
pub fn view_ops(keys: &KeyScheme, entity_id: &str, fingerprint: &str, day: &str) -> Vec<StoreOp> {
    [Scope::Site, Scope::Post(entity_id)]
        .iter()
        .map(|scope| StoreOp::SketchAdd {
            key: keys.daily(scope, Metric::UniqueVisitors, day),
            element: fingerprint.to_string(),
            ttl: keys.retention(),
        })
        .collect()
}

/// Estimated unique visitors for a scope on a given day.
pub async fn estimate<S: CounterStore>(
    store: &S,
    keys: &KeyScheme,
    scope: &Scope<'_>,
    day: &str,
) -> Result<i64> {
    store
        .estimate(&keys.daily(scope, Metric::UniqueVisitors, day))
        .await
}

//! Trending ranking engine.
//!
//! One sorted collection per locale; every view bumps the post's score by
//! one and pushes the whole set's expiry out by the configured rolling
//! window. There is no decay function: the set simply vanishes after a
//! window with no increments, which is the accepted decay mechanism.
//! Scores only move up between expiries.

use crate::error::Result;
use crate::store::keys::{KeyScheme, Metric, Scope};
use crate::store::{CounterStore, StoreOp};

/// Ranking writes for one view: the trending score bump and, when a
/// country was resolved, the per-locale daily country rank bump.
pub fn view_ops(
    keys: &KeyScheme,
    locale: &str,
    entity_id: &str,
    country: Option<&str>,
    day: &str,
) -> Vec<StoreOp> {
    let mut ops = vec![StoreOp::RankIncr {
        key: keys.trending(locale),
        member: KeyScheme::trending_member(entity_id),
        ttl: keys.trending_ttl(),
    }];
    if let Some(country) = country {
        ops.push(StoreOp::RankIncr {
            key: keys.daily(&Scope::Country { locale }, Metric::Views, day),
            member: country.to_string(),
            ttl: keys.retention(),
        });
    }
    ops
}

/// Top `n` trending posts for a locale, highest score first. Members are
/// returned as stored (`post:{id}`).
pub async fn top_posts<S: CounterStore>(
    store: &S,
    keys: &KeyScheme,
    locale: &str,
    n: usize,
) -> Result<Vec<(String, i64)>> {
    store.top(&keys.trending(locale), n).await
}

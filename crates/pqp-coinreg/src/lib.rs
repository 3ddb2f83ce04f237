//! pqp-coinreg
//!
//! `CoinRegistry`: the Generator's view of the tradable-coin universe.
//! Explicit, non-singleton struct owned by the process that constructs it
//! (no global statics) — the `Registry::from_config_json`-style explicit
//! construction the teacher uses elsewhere in the workspace, generalised
//! here to own a cache instead of a static key set.
//!
//! Cache invalidation is two-layered, grounded on
//! `original_source/src/data/coin_registry.py::_is_cache_valid`: a local TTL
//! (cheap, always checked) plus a DB-staleness check (`coins.updated_at`)
//! that catches an out-of-band refresh before the TTL would have expired.

use chrono::{DateTime, Duration, Utc};
use pqp_db::coins::Coin;
use pqp_schemas::Direction;
use sqlx::PgPool;
use std::collections::HashMap;

/// An estimator of the prevailing market regime, injected so the Generator
/// can bias symbol selection without this crate depending on any regime
/// classification logic (out of scope here — §1 Non-goals).
pub trait RegimeEstimator {
    /// Narrow (or reorder) a volume-ranked candidate list for the current
    /// regime. The default no-op estimator returns `candidates` unchanged.
    fn condition(&self, candidates: Vec<String>) -> Vec<String>;
}

/// No-op estimator: every candidate passes through untouched.
pub struct NoRegimeConditioning;

impl RegimeEstimator for NoRegimeConditioning {
    fn condition(&self, candidates: Vec<String>) -> Vec<String> {
        candidates
    }
}

/// Tracks a long → short → bidi → long rotation per candidate source, so a
/// single generator process doesn't accumulate a long-only bias across the
/// strategies it synthesises.
#[derive(Debug, Default)]
pub struct DirectionRotation {
    next_by_source: HashMap<String, Direction>,
}

impl DirectionRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next direction for `source` and advances its rotation.
    pub fn next(&mut self, source: &str) -> Direction {
        let current = *self
            .next_by_source
            .entry(source.to_string())
            .or_insert(Direction::Long);
        let advanced = match current {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Bidi,
            Direction::Bidi => Direction::Long,
        };
        self.next_by_source.insert(source.to_string(), advanced);
        current
    }
}

/// Explicit, non-singleton coin cache. Construct one per owning process
/// (the Generator); do not share across unrelated roles.
pub struct CoinRegistry {
    cache: Vec<Coin>,
    cache_loaded_at: Option<DateTime<Utc>>,
    db_updated_at: Option<DateTime<Utc>>,
}

impl CoinRegistry {
    pub fn new() -> Self {
        Self {
            cache: Vec::new(),
            cache_loaded_at: None,
            db_updated_at: None,
        }
    }

    fn is_cache_valid(&self, now: DateTime<Utc>, ttl: Duration, db_updated_at: Option<DateTime<Utc>>) -> bool {
        let Some(loaded_at) = self.cache_loaded_at else {
            return false;
        };
        if now > loaded_at + ttl {
            return false;
        }
        match (db_updated_at, self.db_updated_at) {
            (Some(fresh), Some(cached)) if fresh > cached => false,
            _ => true,
        }
    }

    /// Refresh the cache from `pool` if the local TTL has elapsed or the DB's
    /// `coins.updated_at` watermark has advanced since the cache was built.
    /// Returns `true` if a refresh happened.
    pub async fn refresh_if_stale(&mut self, pool: &PgPool, ttl: Duration) -> anyhow::Result<bool> {
        let now = Utc::now();
        let db_latest = pqp_db::coins::latest_updated_at(pool).await?;

        if self.is_cache_valid(now, ttl, db_latest) {
            return Ok(false);
        }

        self.cache = pqp_db::coins::list_active_by_volume(pool).await?;
        self.cache_loaded_at = Some(now);
        self.db_updated_at = db_latest;
        Ok(true)
    }

    pub fn is_tradable(&self, symbol: &str) -> bool {
        self.cache.iter().any(|c| c.symbol == symbol)
    }

    /// Top `limit` symbols by 24h volume (cache already sorted that way),
    /// optionally conditioned by `regime`.
    pub fn top_n_by_volume(&self, limit: usize, regime: &dyn RegimeEstimator) -> Vec<String> {
        let ranked: Vec<String> = self.cache.iter().map(|c| c.symbol.clone()).collect();
        let conditioned = regime.condition(ranked);
        conditioned.into_iter().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for CoinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_rotation_cycles_long_short_bidi() {
        let mut rot = DirectionRotation::new();
        assert_eq!(rot.next("direct_synthesis"), Direction::Long);
        assert_eq!(rot.next("direct_synthesis"), Direction::Short);
        assert_eq!(rot.next("direct_synthesis"), Direction::Bidi);
        assert_eq!(rot.next("direct_synthesis"), Direction::Long);
    }

    #[test]
    fn direction_rotation_is_independent_per_source() {
        let mut rot = DirectionRotation::new();
        assert_eq!(rot.next("a"), Direction::Long);
        assert_eq!(rot.next("a"), Direction::Short);
        assert_eq!(rot.next("b"), Direction::Long, "source b starts its own rotation");
    }

    fn coin(symbol: &str, volume: i64) -> Coin {
        Coin {
            symbol: symbol.to_string(),
            max_leverage: 10,
            volume_24h: volume.into(),
            price: 1.into(),
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_registry_has_no_stale_entries() {
        let reg = CoinRegistry::new();
        assert!(reg.is_empty());
        assert!(!reg.is_tradable("BTC"));
    }

    #[test]
    fn cache_invalid_before_first_load() {
        let reg = CoinRegistry::new();
        assert!(!reg.is_cache_valid(Utc::now(), Duration::seconds(300), None));
    }

    #[test]
    fn cache_invalid_once_ttl_elapses() {
        let mut reg = CoinRegistry::new();
        reg.cache = vec![coin("BTC", 1_000_000)];
        reg.cache_loaded_at = Some(Utc::now() - Duration::seconds(400));
        assert!(!reg.is_cache_valid(Utc::now(), Duration::seconds(300), None));
    }

    #[test]
    fn cache_invalid_once_db_watermark_advances() {
        let mut reg = CoinRegistry::new();
        let loaded = Utc::now();
        reg.cache = vec![coin("BTC", 1_000_000)];
        reg.cache_loaded_at = Some(loaded);
        reg.db_updated_at = Some(loaded - Duration::seconds(10));
        let fresher_db_ts = loaded + Duration::seconds(1);
        assert!(!reg.is_cache_valid(loaded, Duration::seconds(300), Some(fresher_db_ts)));
    }

    #[test]
    fn top_n_by_volume_respects_limit_and_conditioning() {
        let mut reg = CoinRegistry::new();
        reg.cache = vec![coin("BTC", 3_000_000), coin("ETH", 2_000_000), coin("SOL", 1_000_000)];
        let top2 = reg.top_n_by_volume(2, &NoRegimeConditioning);
        assert_eq!(top2, vec!["BTC".to_string(), "ETH".to_string()]);
    }
}

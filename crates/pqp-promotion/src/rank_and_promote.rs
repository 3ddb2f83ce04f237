//! `rank_and_promote` (§4.5 step 3): rank `Tested`/`Selected` survivors by
//! their recent-period score, enforce a per-(category, bar_interval) cap,
//! then fill whatever pool capacity remains globally. Grounded on
//! `mqk-promotion`'s tie-break/winner-pick shape, generalised from picking
//! one winner to capping a top-N pool. A `Selected` row that falls out of
//! both caps bounces back to `Tested` — the DAG's one backward edge exists
//! for exactly this.

use std::collections::BTreeMap;

use anyhow::Result;
use pqp_schemas::{Strategy, StrategyStatus};
use sqlx::PgPool;

use crate::config::ClassifierConfig;

struct Ranked {
    strategy: Strategy,
    score: f64,
}

async fn scored_survivors(pool: &PgPool, config: &ClassifierConfig) -> Result<Vec<Ranked>> {
    let mut survivors = pqp_db::strategies::list_by_status(pool, StrategyStatus::Tested).await?;
    survivors.extend(pqp_db::strategies::list_by_status(pool, StrategyStatus::Selected).await?);

    let mut ranked = Vec::with_capacity(survivors.len());
    for strategy in survivors {
        if let Some(recent) = pqp_db::backtest_results::latest_recent_result(pool, strategy.id).await? {
            let score = recent.score(&config.weights);
            ranked.push(Ranked { strategy, score });
        }
    }
    Ok(ranked)
}

/// Caps each `(category, bar_interval)` bucket at `config.per_bucket_cap`,
/// keeping the highest-scoring rows in each bucket.
fn apply_bucket_cap(ranked: Vec<Ranked>, per_bucket_cap: i64) -> Vec<Ranked> {
    let mut buckets: BTreeMap<(String, &'static str), Vec<Ranked>> = BTreeMap::new();
    for r in ranked {
        buckets
            .entry((r.strategy.category.clone(), r.strategy.bar_interval.as_str()))
            .or_default()
            .push(r);
    }

    let mut kept = Vec::new();
    for mut bucket in buckets.into_values() {
        bucket.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        bucket.truncate(per_bucket_cap.max(0) as usize);
        kept.extend(bucket);
    }
    kept
}

/// Promotes the globally top-scoring survivors (after the per-bucket cap)
/// into `Selected`, up to `pool_size - live_count`; bounces any previously
/// `Selected` row that falls outside that set back to `Tested`.
pub async fn rank_and_promote(pool: &PgPool, tracker: &pqp_audit::EventTracker, config: &ClassifierConfig) -> Result<Vec<uuid::Uuid>> {
    let live_count = pqp_db::strategies::count_by_status(pool, StrategyStatus::Live).await?;
    let target_size = (config.pool_size - live_count).max(0) as usize;

    let ranked = scored_survivors(pool, config).await?;
    let mut bucketed = apply_bucket_cap(ranked, config.per_bucket_cap);
    bucketed.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

    let mut promoted = Vec::new();
    for (idx, r) in bucketed.iter().enumerate() {
        let should_be_selected = idx < target_size;
        match (r.strategy.status, should_be_selected) {
            (StrategyStatus::Tested, true) => {
                pqp_db::strategies::advance_status(pool, r.strategy.id, StrategyStatus::Selected).await?;
                tracker.emit_stage_event(
                    Some(r.strategy.id),
                    &r.strategy.name,
                    r.strategy.base_code_hash.clone(),
                    "classifier",
                    "entered",
                    "entered",
                    None,
                    serde_json::json!({ "score": r.score }),
                );
                promoted.push(r.strategy.id);
            }
            (StrategyStatus::Selected, false) => {
                pqp_db::strategies::advance_status(pool, r.strategy.id, StrategyStatus::Tested).await?;
                tracker.emit_stage_event(
                    Some(r.strategy.id),
                    &r.strategy.name,
                    r.strategy.base_code_hash.clone(),
                    "classifier",
                    "bounced_back",
                    "bounced_back",
                    None,
                    serde_json::json!({ "score": r.score }),
                );
            }
            _ => {}
        }
    }

    Ok(promoted)
}

//! `archive_losers` (§4.5 step 4): `Tested` rows that never earned a
//! `Selected` slot, sitting below the archival threshold long enough that
//! they're unlikely to ever clear it, are retired outright rather than
//! left occupying the Tested queue forever.

use anyhow::Result;
use chrono::Utc;
use pqp_schemas::StrategyStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ClassifierConfig;

pub async fn archive_losers(pool: &PgPool, tracker: &pqp_audit::EventTracker, config: &ClassifierConfig) -> Result<Vec<Uuid>> {
    let tested = pqp_db::strategies::list_by_status(pool, StrategyStatus::Tested).await?;
    let mut archived = Vec::new();

    for strategy in tested {
        let Some(tested_at) = strategy.tested_at else { continue };
        if Utc::now() - tested_at < config.archival_min_age {
            continue;
        }

        let Some(recent) = pqp_db::backtest_results::latest_recent_result(pool, strategy.id).await? else {
            continue;
        };
        let score = recent.score(&config.weights);
        if score >= config.archival_score_threshold {
            continue;
        }

        pqp_db::strategies::advance_status(pool, strategy.id, StrategyStatus::Retired).await?;
        tracker.emit_stage_event(
            Some(strategy.id),
            &strategy.name,
            strategy.base_code_hash.clone(),
            "classifier",
            "retired",
            "retired",
            None,
            serde_json::json!({ "reason": "score_below_threshold", "score": score }),
        );
        archived.push(strategy.id);
    }

    Ok(archived)
}

//! `deploy_one` (§4.6): flips one `Selected` strategy to `Live` by claiming a
//! free subaccount and fixing its capital for the life of the deployment.
//! Grounded on `pqp-validation::pipeline::validate_one`'s claim-then-advance
//! shape; capital sizing itself is delegated to `pqp_portfolio::allocator`.

use anyhow::Result;
use pqp_audit::EventTracker;
use pqp_portfolio::allocator::DeploymentTier;
use pqp_schemas::{Strategy, StrategyStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// The capital tier every deployment this cadence draws from. One flat tier
/// for now; nothing here precludes keying tiers by `Strategy.category` later.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    pub tier: DeploymentTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed { subaccount_id: Uuid },
    NoFreeSubaccount,
    Failed { reason: String },
}

/// Runs one deployment attempt against `strategy` (must currently be
/// `Selected`). On any failure the strategy is left `Selected` — there is no
/// partial-deployed state, only claimed-and-live or untouched.
pub async fn deploy_one(
    pool: &PgPool,
    tracker: &EventTracker,
    config: &DeployerConfig,
    strategy: &Strategy,
) -> Result<DeployOutcome> {
    let started = std::time::Instant::now();

    let capital = match config.tier.size() {
        Ok(capital) => capital,
        Err(err) => {
            tracker.emit_stage_event(
                Some(strategy.id),
                &strategy.name,
                strategy.base_code_hash.clone(),
                "deploy",
                "failed",
                "invalid_tier",
                Some(started.elapsed().as_millis() as i64),
                serde_json::json!({ "reason": err.to_string() }),
            );
            return Ok(DeployOutcome::Failed {
                reason: err.to_string(),
            });
        }
    };

    let Some(subaccount) = pqp_db::subaccounts::claim_free_for_strategy(pool, strategy.id).await?
    else {
        tracker.emit_stage_event(
            Some(strategy.id),
            &strategy.name,
            strategy.base_code_hash.clone(),
            "deploy",
            "failed",
            "no_free_subaccount",
            Some(started.elapsed().as_millis() as i64),
            serde_json::Value::Null,
        );
        return Ok(DeployOutcome::NoFreeSubaccount);
    };

    if let Err(err) = pqp_db::subaccounts::initialize_capital(pool, subaccount.id, capital).await {
        // The claim already landed; release it rather than leave the
        // subaccount permanently stuck assigned to a strategy still Selected.
        let _ = pqp_db::subaccounts::release(pool, subaccount.id).await;
        tracker.emit_stage_event(
            Some(strategy.id),
            &strategy.name,
            strategy.base_code_hash.clone(),
            "deploy",
            "failed",
            "capital_init_failed",
            Some(started.elapsed().as_millis() as i64),
            serde_json::json!({ "reason": err.to_string() }),
        );
        return Ok(DeployOutcome::Failed {
            reason: err.to_string(),
        });
    }

    pqp_db::strategies::advance_status(pool, strategy.id, StrategyStatus::Live).await?;

    tracker.emit_stage_event(
        Some(strategy.id),
        &strategy.name,
        strategy.base_code_hash.clone(),
        "deploy",
        "succeeded",
        "deployed",
        Some(started.elapsed().as_millis() as i64),
        serde_json::json!({
            "subaccount_id": subaccount.id,
            "tier": config.tier.name,
            "allocated_capital": capital.to_string(),
        }),
    );

    Ok(DeployOutcome::Deployed {
        subaccount_id: subaccount.id,
    })
}

/// Count of `Selected` strategies still waiting on a deployment slot, for the
/// caller's `pqp_runtime::cooldown` backpressure check.
pub async fn selected_queue_depth(pool: &PgPool) -> Result<i64> {
    pqp_db::strategies::count_by_status(pool, StrategyStatus::Selected).await
}

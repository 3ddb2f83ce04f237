//! Top-level orchestrator (§4.3): runs the five phases against one claimed
//! strategy in sequence, stopping at the first failure, and advances the
//! row's status accordingly. `pqp-cli validate` wires [`validate_one`] and
//! [`validated_queue_depth`] into a `pqp_runtime::ClaimLoop`, the same way
//! `pqp-backtest::pipeline` does.

use anyhow::Result;
use pqp_audit::EventTracker;
use pqp_schemas::{Strategy, StrategyStatus};
use pqp_strategy::StrategyRegistry;
use sqlx::PgPool;

use crate::phase::{PhaseContext, PhaseOutcome, ValidationPhase};

pub fn default_phases() -> Vec<Box<dyn ValidationPhase>> {
    vec![
        Box::new(crate::static_checks::StaticChecks),
        Box::new(crate::dynamic_instantiate::DynamicInstantiate),
        Box::new(crate::synthetic_smoke_test::SyntheticSmokeTest),
        Box::new(crate::shuffle_test::ShuffleTest),
        Box::new(crate::stability_probe::StabilityProbe),
    ]
}

pub enum ValidationOutcome {
    Validated,
    Failed { phase: &'static str, reason: String },
}

/// Runs `phases` in order against `strategy`, stopping at the first
/// failure (§4.3: "any phase failure: status=Failed, a `{phase}_failed`
/// event with reason, stop"). Advances the row's status and emits the
/// terminal event before returning.
pub async fn validate_one(
    pool: &PgPool,
    registry: &StrategyRegistry,
    phases: &[Box<dyn ValidationPhase>],
    tracker: &EventTracker,
    strategy: &Strategy,
) -> Result<ValidationOutcome> {
    let started = std::time::Instant::now();
    let ctx = PhaseContext { pool, registry, strategy };

    for phase in phases {
        match phase.run(&ctx).await? {
            PhaseOutcome::Pass { detail } => {
                tracker.emit_stage_event(
                    Some(strategy.id),
                    &strategy.name,
                    strategy.base_code_hash.clone(),
                    "validate",
                    "phase_passed",
                    phase.name(),
                    None,
                    detail,
                );
            }
            PhaseOutcome::Fail { reason } => {
                pqp_db::strategies::advance_status(pool, strategy.id, StrategyStatus::Failed).await?;
                tracker.emit_stage_event(
                    Some(strategy.id),
                    &strategy.name,
                    strategy.base_code_hash.clone(),
                    "validate",
                    "failed",
                    &format!("{}_failed", phase.name()),
                    Some(started.elapsed().as_millis() as i64),
                    serde_json::json!({ "reason": reason }),
                );
                return Ok(ValidationOutcome::Failed { phase: phase.name(), reason });
            }
        }
    }

    pqp_db::strategies::advance_status(pool, strategy.id, StrategyStatus::Validated).await?;
    tracker.emit_stage_event(
        Some(strategy.id),
        &strategy.name,
        strategy.base_code_hash.clone(),
        "validate",
        "validated",
        "validation_completed",
        Some(started.elapsed().as_millis() as i64),
        serde_json::Value::Null,
    );

    Ok(ValidationOutcome::Validated)
}

/// Queue depth the caller's `pqp_runtime::cooldown` backpressure check is
/// computed against: how many validated candidates are waiting to be
/// backtested.
pub async fn validated_queue_depth(pool: &PgPool) -> Result<i64> {
    pqp_db::strategies::count_by_status(pool, StrategyStatus::Validated).await
}

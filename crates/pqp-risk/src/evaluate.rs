//! `evaluate_conditions` (§4.8/§10): runs the four stop predicates over
//! every `Live` strategy's subaccount plus the global exposure aggregate,
//! throttled to at most once per `config.evaluate_interval` via a stored
//! `scheduled_task_executions` row, the same throttle `pqp-coinreg` uses for
//! its pairs-update refresh cadence.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pqp_audit::EventTracker;
use pqp_schemas::{EmergencyStopState, Scope, StopAction};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::EmergencyStopConfig;
use crate::stop::{check_consecutive_losses, check_daily_loss, check_drawdown, check_global_exposure, TriggeredStop};

const TASK_NAME: &str = "risk_evaluate";

/// Runs one evaluation pass, tripping and persisting every condition that
/// fires. Returns the empty vec without touching anything (not even the
/// throttle bookkeeping) when called before `config.evaluate_interval` has
/// elapsed since the last run.
pub async fn evaluate_conditions(
    pool: &PgPool,
    tracker: &EventTracker,
    config: &EmergencyStopConfig,
) -> Result<Vec<TriggeredStop>> {
    let now = Utc::now();

    let latest = pqp_db::tasks::latest_for_task(pool, TASK_NAME).await?;
    let due = match &latest {
        Some(run) => pqp_db::tasks::is_stale(Some(run.started_at), now, config.evaluate_interval),
        None => true,
    };
    if !due {
        return Ok(Vec::new());
    }

    let task_id = Uuid::new_v4();
    pqp_db::tasks::start_task(pool, task_id, TASK_NAME).await?;

    let result = run_checks(pool, tracker, config, now).await;

    match &result {
        Ok(triggers) => {
            pqp_db::tasks::finish_task(pool, task_id, pqp_schemas::TaskStatus::Succeeded, Some(triggers.len() as i64), None).await?;
        }
        Err(err) => {
            pqp_db::tasks::finish_task(pool, task_id, pqp_schemas::TaskStatus::Failed, None, Some(&err.to_string())).await?;
        }
    }

    result
}

async fn run_checks(
    pool: &PgPool,
    tracker: &EventTracker,
    config: &EmergencyStopConfig,
    now: DateTime<Utc>,
) -> Result<Vec<TriggeredStop>> {
    let live_strategies = pqp_db::strategies::list_live_strategies(pool).await?;
    let mut triggers = Vec::new();
    let mut total_allocated = Decimal::ZERO;

    for strategy in &live_strategies {
        let Some(subaccount) = pqp_db::subaccounts::fetch_by_strategy_id(pool, strategy.id).await? else {
            continue;
        };
        total_allocated += subaccount.allocated_capital;

        if let Some(trip) = check_drawdown(&subaccount, config) {
            trip_and_emit(pool, tracker, &trip, now, config, Some(strategy.id), &strategy.name, strategy.base_code_hash.clone()).await?;
            triggers.push(trip);
            continue;
        }
        if let Some(trip) = check_daily_loss(&subaccount, config) {
            trip_and_emit(pool, tracker, &trip, now, config, Some(strategy.id), &strategy.name, strategy.base_code_hash.clone()).await?;
            triggers.push(trip);
            continue;
        }

        let closed = pqp_db::trades::list_closed_for_strategy(pool, strategy.id).await?;
        if let Some(trip) = check_consecutive_losses(subaccount.id, &closed, config) {
            trip_and_emit(pool, tracker, &trip, now, config, Some(strategy.id), &strategy.name, strategy.base_code_hash.clone()).await?;
            triggers.push(trip);
        }
    }

    if let Some(trip) = check_global_exposure(total_allocated, config) {
        trip_and_emit(pool, tracker, &trip, now, config, None, "global-risk", None).await?;
        triggers.push(trip);
    }

    Ok(triggers)
}

#[allow(clippy::too_many_arguments)]
async fn trip_and_emit(
    pool: &PgPool,
    tracker: &EventTracker,
    trip: &TriggeredStop,
    now: DateTime<Utc>,
    config: &EmergencyStopConfig,
    strategy_id: Option<Uuid>,
    strategy_name: &str,
    base_code_hash: Option<String>,
) -> Result<()> {
    let state = EmergencyStopState {
        scope: trip.scope,
        scope_id: trip.scope_id,
        is_stopped: true,
        reason: trip.reason.clone(),
        action: trip.action,
        stop_time: now,
        cooldown_until: trip.cooldown_until(now, config),
        reset_trigger: trip.reset_trigger.clone(),
    };

    match trip.scope {
        Scope::Global => pqp_db::emergency_stop::trip_global(pool, &state).await?,
        Scope::Subaccount | Scope::Strategy => pqp_db::emergency_stop::trip(pool, &state).await?,
    }

    tracker.emit_stage_event(
        strategy_id,
        strategy_name,
        base_code_hash,
        "risk",
        "tripped",
        action_event_type(trip.action),
        None,
        serde_json::json!({
            "scope": scope_label(trip.scope),
            "scope_id": trip.scope_id,
            "reason": trip.reason,
        }),
    );

    Ok(())
}

fn action_event_type(action: StopAction) -> &'static str {
    match action {
        StopAction::Pause => "paused",
        StopAction::ClosePositions => "closed_positions",
    }
}

fn scope_label(scope: Scope) -> &'static str {
    match scope {
        Scope::Global => "global",
        Scope::Subaccount => "subaccount",
        Scope::Strategy => "strategy",
    }
}

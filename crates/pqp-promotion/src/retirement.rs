//! `check_retirements` (§4.5 step 2): the only place a `LIVE` strategy flips
//! to `Retired` on its own performance. Four independent predicates, any one
//! of which retires the strategy; a drawdown breach or inactivity bound
//! retires immediately, a low score only after
//! `config.retirement_strike_limit` consecutive cycles below threshold.

use anyhow::Result;
use chrono::Utc;
use pqp_audit::EventTracker;
use pqp_schemas::{BacktestResult, StrategyStatus, SubaccountStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ClassifierConfig;
use crate::live_metrics::compute_live_result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirementReason {
    DrawdownBreach,
    Inactivity,
    LiveVsBacktestDivergence,
    ScoreBelowThreshold,
}

impl RetirementReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RetirementReason::DrawdownBreach => "drawdown_breach",
            RetirementReason::Inactivity => "inactivity",
            RetirementReason::LiveVsBacktestDivergence => "live_vs_backtest_divergence",
            RetirementReason::ScoreBelowThreshold => "score_below_threshold",
        }
    }
}

async fn retire(pool: &PgPool, tracker: &EventTracker, strategy_id: Uuid, reason: RetirementReason) -> Result<()> {
    let strategy = pqp_db::fetch_strategy(pool, strategy_id).await?;
    pqp_db::strategies::advance_status(pool, strategy_id, StrategyStatus::Retired).await?;

    if let Some(subaccount) = pqp_db::subaccounts::fetch_by_strategy_id(pool, strategy_id).await? {
        pqp_db::subaccounts::release(pool, subaccount.id).await?;
        pqp_db::subaccounts::set_status(pool, subaccount.id, SubaccountStatus::Active).await?;
    }
    pqp_db::retirement_strikes::delete(pool, strategy_id).await?;

    tracker.emit_stage_event(
        Some(strategy_id),
        &strategy.name,
        strategy.base_code_hash.clone(),
        "classifier",
        "retired",
        "retired",
        None,
        serde_json::json!({ "reason": reason.as_str() }),
    );
    Ok(())
}

/// Runs the four retirement predicates over every `LIVE` strategy, retiring
/// whichever ones trip. Returns the ids retired this cycle.
pub async fn check_retirements(pool: &PgPool, tracker: &EventTracker, config: &ClassifierConfig) -> Result<Vec<Uuid>> {
    let live = pqp_db::strategies::list_live_strategies(pool).await?;
    let mut retired = Vec::new();

    for strategy in live {
        if let Some(subaccount) = pqp_db::subaccounts::fetch_by_strategy_id(pool, strategy.id).await? {
            if subaccount.drawdown_fraction() >= config.retirement_drawdown_threshold {
                retire(pool, tracker, strategy.id, RetirementReason::DrawdownBreach).await?;
                retired.push(strategy.id);
                continue;
            }
        }

        let trades = pqp_db::trades::list_closed_for_strategy(pool, strategy.id).await?;
        if let Some(last) = trades.last() {
            if let Some(exit_time) = last.exit_time {
                if Utc::now() - exit_time > config.inactivity_bound {
                    retire(pool, tracker, strategy.id, RetirementReason::Inactivity).await?;
                    retired.push(strategy.id);
                    continue;
                }
            }
        }

        let live_result: Option<BacktestResult> =
            compute_live_result(strategy.id, &trades, config.recent_trade_window, config.recency_max_penalty);
        let Some(live_result) = live_result else {
            continue;
        };
        let live_score = live_result.score(&config.weights);

        if let Some(backtest_full) = pqp_db::backtest_results::latest_full_result(pool, strategy.id).await? {
            let backtest_score = backtest_full.score(&config.weights);
            if backtest_score - live_score > config.divergence_threshold {
                retire(pool, tracker, strategy.id, RetirementReason::LiveVsBacktestDivergence).await?;
                retired.push(strategy.id);
                continue;
            }
        }

        if live_score < config.retirement_score_threshold {
            let strikes = pqp_db::retirement_strikes::record_strike(pool, strategy.id, live_score).await?;
            if strikes >= config.retirement_strike_limit {
                retire(pool, tracker, strategy.id, RetirementReason::ScoreBelowThreshold).await?;
                retired.push(strategy.id);
            }
        } else {
            pqp_db::retirement_strikes::reset(pool, strategy.id, live_score).await?;
        }
    }

    Ok(retired)
}

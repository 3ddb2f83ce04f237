//! Pure stop predicates (§4.8/§10), generalising `mqk-risk::engine`'s
//! guard-function shape (one pure check per condition, `None` when it
//! passes) from a single running account to a fetched aggregate per scope.

use chrono::{DateTime, Utc};
use pqp_schemas::{Scope, StopAction, Subaccount, Trade};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::EmergencyStopConfig;

/// A stop condition one of the pure checks below decided should trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredStop {
    pub scope: Scope,
    pub scope_id: Option<Uuid>,
    pub reason: String,
    pub action: StopAction,
    /// Set only for the most severe trips (drawdown breach): the row stays
    /// stopped past cooldown until a human clears it (§4.8 `auto_reset`).
    pub reset_trigger: Option<String>,
}

impl TriggeredStop {
    pub fn cooldown_until(&self, now: DateTime<Utc>, cfg: &EmergencyStopConfig) -> DateTime<Utc> {
        now + cfg.cooldown
    }
}

/// §10: "drawdown-from-peak" — closes positions once a subaccount's
/// fractional drawdown reaches the configured limit.
pub fn check_drawdown(subaccount: &Subaccount, cfg: &EmergencyStopConfig) -> Option<TriggeredStop> {
    let dd = subaccount.drawdown_fraction();
    if dd >= cfg.drawdown_limit {
        Some(TriggeredStop {
            scope: Scope::Subaccount,
            scope_id: Some(subaccount.id),
            reason: format!("drawdown {dd} >= limit {}", cfg.drawdown_limit),
            action: StopAction::ClosePositions,
            reset_trigger: Some("manual_review_required".to_string()),
        })
    } else {
        None
    }
}

/// §10: "daily-PnL-limit" — pauses new risk once today's loss reaches the
/// configured absolute amount. A pause lets open positions run, unlike a
/// drawdown breach which closes them.
pub fn check_daily_loss(subaccount: &Subaccount, cfg: &EmergencyStopConfig) -> Option<TriggeredStop> {
    if subaccount.daily_pnl <= -cfg.daily_loss_limit {
        Some(TriggeredStop {
            scope: Scope::Subaccount,
            scope_id: Some(subaccount.id),
            reason: format!("daily_pnl {} <= -{}", subaccount.daily_pnl, cfg.daily_loss_limit),
            action: StopAction::Pause,
            reset_trigger: None,
        })
    } else {
        None
    }
}

/// §10: "N-consecutive-losses" — `closed_trades` must already be sorted
/// oldest-first; only the most recent `consecutive_losses_limit` trades are
/// inspected.
pub fn check_consecutive_losses(
    subaccount_id: Uuid,
    closed_trades: &[Trade],
    cfg: &EmergencyStopConfig,
) -> Option<TriggeredStop> {
    let limit = cfg.consecutive_losses_limit as usize;
    if limit == 0 || closed_trades.len() < limit {
        return None;
    }

    let tail = &closed_trades[closed_trades.len() - limit..];
    let all_losses = tail
        .iter()
        .all(|t| t.realized_pnl.map(|pnl| pnl < Decimal::ZERO).unwrap_or(false));

    if all_losses {
        Some(TriggeredStop {
            scope: Scope::Subaccount,
            scope_id: Some(subaccount_id),
            reason: format!("{limit} consecutive losing trades"),
            action: StopAction::Pause,
            reset_trigger: None,
        })
    } else {
        None
    }
}

/// §10: "global exposure" — total allocated capital across every `Live`
/// subaccount, paused globally rather than per-subaccount since it reflects
/// aggregate risk no single subaccount controls.
pub fn check_global_exposure(total_allocated: Decimal, cfg: &EmergencyStopConfig) -> Option<TriggeredStop> {
    if total_allocated >= cfg.global_exposure_limit {
        Some(TriggeredStop {
            scope: Scope::Global,
            scope_id: None,
            reason: format!("total allocated capital {total_allocated} >= limit {}", cfg.global_exposure_limit),
            action: StopAction::Pause,
            reset_trigger: None,
        })
    } else {
        None
    }
}

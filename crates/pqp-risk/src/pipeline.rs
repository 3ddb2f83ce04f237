//! Cadence driver for the EmergencyStopManager (§4.8). Mirrors
//! `pqp-promotion::pipeline::run_once`/`run_cadence`: a fixed tick rather
//! than a claim queue, since evaluation is a scan over every `Live`
//! strategy, not a single-row transaction.

use std::time::Duration;

use anyhow::Result;
use pqp_audit::EventTracker;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::EmergencyStopConfig;
use crate::evaluate::evaluate_conditions;
use crate::reset::auto_reset;

/// Evaluates stop conditions, then clears whatever has cooled down and can
/// auto-reset. `evaluate_conditions` throttles itself internally, so this is
/// safe to call on a tick much shorter than `config.evaluate_interval`.
pub async fn run_once(pool: &PgPool, tracker: &EventTracker, config: &EmergencyStopConfig) -> Result<()> {
    let triggered = evaluate_conditions(pool, tracker, config).await?;
    if !triggered.is_empty() {
        tracing::info!(count = triggered.len(), "emergency stop: conditions tripped");
    }

    let cleared = auto_reset(pool).await?;
    if cleared > 0 {
        tracing::info!(count = cleared, "emergency stop: auto-reset cleared");
    }

    Ok(())
}

pub async fn run_cadence(pool: PgPool, tracker: EventTracker, config: EmergencyStopConfig, tick: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("risk cadence loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = run_once(&pool, &tracker, &config).await {
                    tracing::warn!(error = %err, "emergency stop cycle failed, will retry next tick");
                }
            }
        }
    }
}

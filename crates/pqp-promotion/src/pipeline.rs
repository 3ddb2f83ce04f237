//! Top-level cadence driver for the Classifier (§4.5): unlike every other
//! role, this one scans the whole table on a fixed tick rather than claiming
//! single rows — it's the only role permitted to flip TESTED<->SELECTED and
//! LIVE->RETIRED, so there is no queue to contend over. Grounded on
//! `mqk-daemon::state::spawn_heartbeat`'s `tokio::time::interval` loop.

use std::time::Duration;

use anyhow::Result;
use pqp_audit::EventTracker;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::archive::archive_losers;
use crate::config::ClassifierConfig;
use crate::rank_and_promote::rank_and_promote;
use crate::retirement::check_retirements;

/// Runs the four classification steps once, in the order the spec fixes
/// them: retirements free slots and subaccounts before ranking tries to
/// fill them, archival runs last so it never competes with a row that just
/// got promoted this same cycle.
pub async fn run_once(pool: &PgPool, tracker: &EventTracker, config: &ClassifierConfig) -> Result<()> {
    let retired = check_retirements(pool, tracker, config).await?;
    tracing::info!(count = retired.len(), "classifier: retirements processed");

    let promoted = rank_and_promote(pool, tracker, config).await?;
    tracing::info!(count = promoted.len(), "classifier: promotions processed");

    let archived = archive_losers(pool, tracker, config).await?;
    tracing::info!(count = archived.len(), "classifier: archived losers");

    Ok(())
}

/// Drives [`run_once`] on a fixed tick until `shutdown` fires. A failed
/// cycle is logged and retried on the next tick rather than stopping the
/// loop — the Classifier is a scan, not a transaction, and the next tick
/// will simply re-evaluate whatever didn't get processed.
pub async fn run_cadence(pool: PgPool, tracker: EventTracker, config: ClassifierConfig, tick: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("classifier cadence loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = run_once(&pool, &tracker, &config).await {
                    tracing::warn!(error = %err, "classifier cycle failed, will retry next tick");
                }
            }
        }
    }
}

//! pqp-audit
//!
//! `EventTracker`: the single emission point for every `StrategyEvent`
//! (§4.9, Invariant 6). Grounded on the teacher's `AuditWriter` sequencing
//! discipline, retargeted from an append-only JSONL file to a bounded
//! in-memory queue drained by a background flusher into `strategy_events`.
//! `emit` never blocks the caller and never propagates a DB failure —
//! "best-effort, never blocking" is the whole contract.

use std::sync::Arc;

use chrono::Utc;
use pqp_schemas::StrategyEvent;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Bound on the in-memory queue. Once full, `emit` drops the event rather
/// than blocking the caller or growing unbounded under sustained DB outage.
const QUEUE_CAPACITY: usize = 4096;

/// Batch size and flush cadence for the background writer.
const FLUSH_BATCH_SIZE: usize = 64;
const FLUSH_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);

#[derive(Clone)]
pub struct EventTracker {
    tx: mpsc::Sender<StrategyEvent>,
}

impl EventTracker {
    /// Spawn the background flusher against `pool` and return a handle.
    /// Dropping every clone of the returned `EventTracker` closes the
    /// channel and lets the flusher drain its remaining buffer, then exit.
    pub fn spawn(pool: PgPool) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_flusher(pool, rx));
        Self { tx }
    }

    /// Construct a tracker with no running flusher, for tests that only
    /// need to assert on what was enqueued via a paired receiver.
    #[cfg(test)]
    fn with_channel(capacity: usize) -> (Self, mpsc::Receiver<StrategyEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Record one pipeline event. Non-blocking: if the queue is full the
    /// event is dropped and a warning logged, never propagated to the caller.
    pub fn emit(&self, ev: StrategyEvent) {
        match self.tx.try_send(ev) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(stage = %ev.stage, event_type = %ev.event_type, "event queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("event tracker channel closed, dropping event");
            }
        }
    }

    /// Convenience constructor for the common case: a stage transition or
    /// terminal outcome on one strategy.
    pub fn emit_stage_event(
        &self,
        strategy_id: Option<Uuid>,
        strategy_name: &str,
        base_code_hash: Option<String>,
        stage: &str,
        status: &str,
        event_type: &str,
        duration_ms: Option<i64>,
        detail: serde_json::Value,
    ) {
        self.emit(StrategyEvent {
            event_id: Uuid::new_v4(),
            ts: Utc::now(),
            strategy_id,
            strategy_name: strategy_name.to_string(),
            base_code_hash,
            event_type: event_type.to_string(),
            stage: stage.to_string(),
            status: status.to_string(),
            duration_ms,
            detail,
        });
    }
}

/// Drains `rx` in batches, inserting each event individually (the schema has
/// no bulk-insert path) and requeuing a failed batch exactly once before
/// dropping it — mirrors the teacher's single-retry-then-drop discipline.
async fn run_flusher(pool: PgPool, mut rx: mpsc::Receiver<StrategyEvent>) {
    let pool = Arc::new(pool);
    let mut buf = Vec::with_capacity(FLUSH_BATCH_SIZE);
    let mut ticker = tokio::time::interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            biased;
            maybe_ev = rx.recv() => {
                match maybe_ev {
                    Some(ev) => {
                        buf.push(ev);
                        if buf.len() >= FLUSH_BATCH_SIZE {
                            flush(&pool, &mut buf, false).await;
                        }
                    }
                    None => {
                        // Sender dropped: flush whatever remains and exit.
                        flush(&pool, &mut buf, false).await;
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                if !buf.is_empty() {
                    flush(&pool, &mut buf, false).await;
                }
            }
        }
    }
}

async fn flush(pool: &PgPool, buf: &mut Vec<StrategyEvent>, is_retry: bool) {
    let mut failed = Vec::new();
    for ev in buf.drain(..) {
        if let Err(err) = pqp_db::events::insert_event(pool, &ev).await {
            tracing::warn!(error = %err, event_id = %ev.event_id, "failed to persist strategy event");
            failed.push(ev);
        }
    }
    if failed.is_empty() {
        return;
    }
    if is_retry {
        tracing::warn!(count = failed.len(), "dropping events after retry failed");
        return;
    }
    *buf = failed;
    Box::pin(flush(pool, buf, true)).await;
}

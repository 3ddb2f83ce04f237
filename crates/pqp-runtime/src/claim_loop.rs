use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::cooldown::cooldown;

/// Backpressure parameters for [`ClaimLoop::run`]; see [`cooldown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackpressureConfig {
    pub limit: u64,
    pub base: Duration,
    pub k: Duration,
    pub max: Duration,
}

/// Generic claim-loop driver shared by every role that works a queue
/// (Generator against the `GENERATED` depth, Validator/Backtester against
/// their stage queues): a bounded worker pool, a shutdown signal, and a
/// backpressure check against a caller-supplied downstream depth, each
/// tick. Grounded on `mqk-testkit::orchestrator`'s loop-composition shape
/// and `mqk-daemon::state::spawn_heartbeat`'s `tokio::time::interval` use,
/// generalised from a fixed bar/strategy/execution pipeline to an arbitrary
/// claim/handle pair.
pub struct ClaimLoop {
    workers: usize,
    shutdown: CancellationToken,
}

impl ClaimLoop {
    pub fn new(workers: usize, shutdown: CancellationToken) -> Self {
        assert!(workers > 0, "worker pool must have at least one slot");
        Self { workers, shutdown }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Drives `claim`/`handle` until the shutdown token fires. `claim`
    /// pulls at most one unit of work (or `None` if the queue is empty);
    /// `handle` runs it under a semaphore permit so at most `workers` run
    /// concurrently; `depth` is queried before every claim attempt and
    /// feeds [`cooldown`] to decide whether to sleep instead of claiming.
    pub async fn run<T, C, Cf, H, Hf, D, Df>(
        &self,
        mut claim: C,
        handle: H,
        mut depth: D,
        poll_interval: Duration,
        backpressure: BackpressureConfig,
    ) where
        T: Send + 'static,
        C: FnMut() -> Cf,
        Cf: Future<Output = anyhow::Result<Option<T>>>,
        H: Fn(T) -> Hf + Send + Sync + 'static,
        Hf: Future<Output = ()> + Send + 'static,
        D: FnMut() -> Df,
        Df: Future<Output = anyhow::Result<u64>>,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let handle = Arc::new(handle);

        loop {
            if self.shutdown.is_cancelled() {
                tracing::debug!("claim loop shutdown requested, no new claims will be issued");
                break;
            }

            let depth_now = match depth().await {
                Ok(d) => d,
                Err(err) => {
                    tracing::warn!(error = %err, "depth query failed, retrying after poll interval");
                    if self.sleep_or_shutdown(poll_interval).await {
                        break;
                    }
                    continue;
                }
            };

            let wait = cooldown(depth_now, backpressure.limit, backpressure.base, backpressure.k, backpressure.max);
            if wait > backpressure.base {
                tracing::debug!(depth = depth_now, cooldown_ms = wait.as_millis() as u64, "backpressure cooldown");
                if self.sleep_or_shutdown(wait).await {
                    break;
                }
                continue;
            }

            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit.expect("semaphore is never closed"),
                _ = self.shutdown.cancelled() => break,
            };

            match claim().await {
                Ok(Some(item)) => {
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        handle(item).await;
                    });
                }
                Ok(None) => {
                    drop(permit);
                    if self.sleep_or_shutdown(poll_interval).await {
                        break;
                    }
                }
                Err(err) => {
                    drop(permit);
                    tracing::warn!(error = %err, "claim failed, retrying after poll interval");
                    if self.sleep_or_shutdown(poll_interval).await {
                        break;
                    }
                }
            }
        }
    }

    /// Sleeps `d` unless shutdown fires first. Returns `true` if shutdown
    /// won the race, signalling the caller to stop the loop.
    async fn sleep_or_shutdown(&self, d: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(d) => false,
            _ = self.shutdown.cancelled() => true,
        }
    }
}

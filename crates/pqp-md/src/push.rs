//! Live push-data contract for the Executor's per-tick loop (§4.7). Shaped
//! like `HistoricalProvider` (same crate, `lib.rs`) but push rather than
//! pull: a subscription hands back a channel the tick loop drains, instead
//! of a request/response round trip, so nothing on the hot path blocks on
//! HTTP.

use std::fmt;

use async_trait::async_trait;
use pqp_schemas::BarInterval;
use pqp_strategy::Bar;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

/// Errors a [`PushClient`] implementation may return.
#[derive(Debug)]
pub enum PushError {
    Transport(String),
    NotSubscribed { symbol: String },
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Transport(msg) => write!(f, "push transport error: {msg}"),
            PushError::NotSubscribed { symbol } => write!(f, "not subscribed to {symbol}"),
        }
    }
}

impl std::error::Error for PushError {}

/// One symbol's mid-price update from the venue's all-mids feed.
#[derive(Debug, Clone, PartialEq)]
pub struct MidUpdate {
    pub symbol: String,
    pub mid: Decimal,
}

/// One closed or in-progress candle update for `(symbol, interval)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleUpdate {
    pub symbol: String,
    pub interval: BarInterval,
    pub bar: Bar,
}

/// A subaccount's observed balance at the venue, used by `pqp-reconcile`'s
/// startup reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub venue_account_id: String,
    pub balance: Decimal,
}

/// Venue push-data boundary. Implementations must be `Send + Sync` so a
/// `Box<dyn PushClient>` can cross the Executor's per-subaccount task
/// boundaries.
#[async_trait]
pub trait PushClient: Send + Sync {
    /// Subscribes to every symbol's mid price. One subscription serves the
    /// whole process; the tick loop filters by symbol on read.
    async fn subscribe_all_mids(&self) -> Result<mpsc::Receiver<MidUpdate>, PushError>;

    /// Subscribes to `(symbol, interval)` candles. Returns a fresh channel
    /// per call; callers that need the same pair twice subscribe twice.
    async fn subscribe_candles(&self, symbol: &str, interval: BarInterval) -> Result<mpsc::Receiver<CandleUpdate>, PushError>;

    /// Current observed account balance, polled once at Executor startup
    /// and on the reconcile cadence — never on the per-tick path.
    async fn account_state(&self, venue_account_id: &str) -> Result<AccountState, PushError>;
}

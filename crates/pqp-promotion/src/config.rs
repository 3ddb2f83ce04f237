//! Tunables for the four classification steps (§4.5). No `Default` on
//! purpose: every threshold here trades real capital against real risk and
//! should come from an explicit deployment config, not a silent fallback.

use pqp_schemas::ScoreWeights;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Rubric used for both live-retirement and pool-ranking scores (§9 Open
    /// Question, resolved: the recency-weighted variant serves both).
    pub weights: ScoreWeights,
    /// A live strategy scoring below this for `retirement_strike_limit`
    /// consecutive cycles is retired.
    pub retirement_score_threshold: f64,
    pub retirement_strike_limit: i32,
    /// Fractional drawdown from peak balance that retires a strategy
    /// immediately, bypassing the strike counter.
    pub retirement_drawdown_threshold: rust_decimal::Decimal,
    /// A `LIVE` strategy with no closed trade within this window is retired
    /// as inactive rather than left to occupy a pool slot indefinitely.
    pub inactivity_bound: chrono::Duration,
    /// Retire immediately if the live recent score falls more than this far
    /// below the strategy's latest full-history backtest score.
    pub divergence_threshold: f64,
    /// How many trailing closed trades feed the "recent" half of the live
    /// dual-period comparison.
    pub recent_trade_window: usize,
    pub recency_max_penalty: f64,
    /// Max pool slots per (category, bar_interval) bucket.
    pub per_bucket_cap: i64,
    /// Total number of strategies the pool may hold Live at once.
    pub pool_size: i64,
    /// `Tested` rows below this recent-period score are archived once old enough.
    pub archival_score_threshold: f64,
    pub archival_min_age: chrono::Duration,
}

//! Raw (un-weighted) metrics produced by one replay, and the interval-sweep
//! result that wraps one per configured [`BarInterval`].

use pqp_schemas::BarInterval;

/// Metrics computed directly from a set of [`crate::replay::ClosedTrade`]s,
/// before any recency weighting is applied. Field names mirror
/// `pqp_schemas::BacktestResult`'s raw columns so a `RawMetrics` maps onto one
/// `BacktestResult` row without renaming.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMetrics {
    pub sharpe: f64,
    pub win_rate: f64,
    pub expectancy: f64,
    pub drawdown: f64,
    pub trade_count: i32,
    pub total_return: f64,
    pub walk_forward_stability: f64,
}

impl RawMetrics {
    pub fn zero() -> Self {
        Self {
            sharpe: 0.0,
            win_rate: 0.0,
            expectancy: 0.0,
            drawdown: 0.0,
            trade_count: 0,
            total_return: 0.0,
            walk_forward_stability: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntervalResult {
    pub interval: BarInterval,
    pub metrics: RawMetrics,
}

/// Input to one `pqp-backtest` run over one candidate strategy.
#[derive(Clone, Debug)]
pub struct BacktestRunConfig {
    pub symbols: Vec<String>,
    /// Trailing-window length (in bars) for the "recent" half of the
    /// dual-period evaluation.
    pub recent_window_bars: usize,
    pub recency_max_penalty: f64,
    pub weights: pqp_schemas::ScoreWeights,
    pub admission_threshold: f64,
}

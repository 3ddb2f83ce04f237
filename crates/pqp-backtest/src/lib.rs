//! pqp-backtest
//!
//! The Backtester role (§4.4): a vectorised, prefix-bounded replay engine
//! plus the interval sweep, dual-period recency weighting, and pool
//! admission scoring built on top of it. `pqp-cli backtest` drives this
//! crate's claim loop; persistence is `pqp-db`, the scoring rubric itself
//! lives on `pqp_schemas::BacktestResult`.

mod dual_period;
mod engine;
mod metrics;
mod pipeline;
mod recency;
mod replay;
mod scoring;
mod sweep;
mod types;

pub use dual_period::dual_period;
pub use engine::run as run_all_symbols;
pub use pipeline::{run_for_strategy, BacktestOutcome};
pub use recency::recency_weight;
pub use replay::{run_single_symbol, ClosedTrade};
pub use scoring::score;
pub use sweep::{best_interval, interval_sweep};
pub use types::{BacktestRunConfig, IntervalResult, RawMetrics};

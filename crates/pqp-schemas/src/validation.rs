use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BarInterval;

/// Shuffle cache (§3 "ValidationCache"), keyed solely by `code_hash` (§6).
/// Authoritative: any strategy sharing the hash inherits its pass/fail
/// without re-execution (Invariant 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValidationCache {
    pub code_hash: String,
    pub passed: bool,
    pub checked_at: DateTime<Utc>,
    /// Populated only when the optional stability probe ran (§4.3 phase 5).
    pub stability_coefficient_of_variation: Option<f64>,
}

/// `full` vs `recent` window (§3 "BacktestResult").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PeriodType {
    Full,
    Recent,
}

/// A single backtest row for one strategy/period/interval combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BacktestResult {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub period_type: PeriodType,
    pub sharpe: f64,
    pub win_rate: f64,
    pub expectancy: f64,
    pub drawdown: f64,
    pub trade_count: i32,
    pub total_return: f64,
    pub walk_forward_stability: f64,
    pub symbols_tested: Vec<String>,
    pub bar_interval_tested: BarInterval,
    pub is_optimal_interval: bool,
    pub weighted_sharpe: f64,
    pub weighted_win_rate: f64,
    pub weighted_expectancy: f64,
    /// `recent_sharpe / full_sharpe`; `None` on `full` rows.
    pub recency_ratio: Option<f64>,
    /// Bounded deduction applied to the weighted metrics when `recency_ratio < 1`.
    pub recency_penalty: f64,
    /// On a `recent` row, the paired `full` row (Invariant 7). `None` on `full` rows.
    pub full_result_id: Option<Uuid>,
    /// On a `full` row, the paired `recent` row once computed. `None` on `recent` rows.
    pub recent_result_id: Option<Uuid>,
}

impl BacktestResult {
    /// A row's score under the recency-weighted rubric (§4.4 step 4, §9 Open
    /// Question — resolved in favour of the recency-weighted variant for both
    /// pool admission and live-retirement decisions; see DESIGN.md).
    pub fn score(&self, weights: &ScoreWeights) -> f64 {
        weights.edge_expectancy * self.weighted_expectancy
            + weights.sharpe * self.weighted_sharpe
            + weights.consistency_win_rate * self.weighted_win_rate
            + weights.walk_forward_stability * self.walk_forward_stability
    }
}

/// Weight vector for the scoring rubric (§4.4 step 4 / §4.5 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub edge_expectancy: f64,
    pub sharpe: f64,
    pub consistency_win_rate: f64,
    pub walk_forward_stability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            edge_expectancy: 0.30,
            sharpe: 0.30,
            consistency_win_rate: 0.20,
            walk_forward_stability: 0.20,
        }
    }
}

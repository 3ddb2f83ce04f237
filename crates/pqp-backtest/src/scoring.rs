//! Thin delegation to `pqp_schemas::BacktestResult::score` — the weighted-sum
//! rubric lives on the record type itself so the Classifier can re-score a
//! persisted row without depending on this crate.

use pqp_schemas::{BacktestResult, ScoreWeights};

pub fn score(result: &BacktestResult, weights: &ScoreWeights) -> f64 {
    result.score(weights)
}

//! Interval sweep (§4.4 step 2): run the replay once per bar interval a
//! candidate could plausibly trade at, and keep the one with the best raw
//! sharpe as `optimal_bar_interval`.

use std::collections::BTreeMap;

use pqp_schemas::BarInterval;
use pqp_strategy::{Bar, Strategy};

use crate::engine;
use crate::types::IntervalResult;

/// `bars_by_interval` pairs each interval under test with the bars-by-symbol
/// map fetched at that interval. Returns one [`IntervalResult`] per entry, in
/// the order given.
pub fn interval_sweep(
    strategy: &dyn Strategy,
    bars_by_interval: &[(BarInterval, BTreeMap<String, Vec<Bar>>)],
) -> Vec<IntervalResult> {
    bars_by_interval
        .iter()
        .map(|(interval, bars_by_symbol)| IntervalResult {
            interval: *interval,
            metrics: engine::run(strategy, bars_by_symbol),
        })
        .collect()
}

/// The interval with the highest raw sharpe. Ties keep the first (lowest
/// index, i.e. the order `bars_by_interval` was given in).
pub fn best_interval(results: &[IntervalResult]) -> Option<&IntervalResult> {
    results.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(b) if candidate.metrics.sharpe > b.metrics.sharpe => Some(candidate),
        Some(b) => Some(b),
    })
}

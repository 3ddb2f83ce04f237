//! Reduces a set of closed trades into [`RawMetrics`]. Grounded on the
//! teacher's `mqk-promotion::evaluator::compute_metrics` shape, generalised
//! from a single-account PnL ledger to a flat trade list.

use crate::replay::ClosedTrade;
use crate::types::RawMetrics;

/// `compute(trades)` over every symbol's closed trades in one run.
/// `walk_forward_stability` uses the coefficient-of-variation-complement
/// across halves of the trade sequence — stable equity growth scores near
/// `1.0`, erratic growth scores near `0.0`.
pub fn compute(trades: &[ClosedTrade]) -> RawMetrics {
    if trades.is_empty() {
        return RawMetrics::zero();
    }

    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_ratio).collect();
    let n = returns.len();

    let mean = returns.iter().sum::<f64>() / n as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();
    let sharpe = if std_dev > 0.0 { mean / std_dev } else { 0.0 };

    let wins = returns.iter().filter(|r| **r > 0.0).count();
    let win_rate = wins as f64 / n as f64;

    let expectancy = mean;

    let total_return = returns.iter().fold(1.0_f64, |acc, r| acc * (1.0 + r)) - 1.0;

    let drawdown = max_drawdown(&returns);

    let walk_forward_stability = stability_across_halves(&returns);

    RawMetrics {
        sharpe,
        win_rate,
        expectancy,
        drawdown,
        trade_count: n as i32,
        total_return,
        walk_forward_stability,
    }
}

/// Maximum peak-to-trough drawdown of the compounding equity curve implied
/// by `returns`, as a positive fraction.
fn max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        let dd = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
        worst = worst.max(dd);
    }
    worst
}

/// `1 - min(1, |sharpe_first_half - sharpe_second_half| / scale)`: a rough
/// stability score that penalises a strategy whose edge is concentrated in
/// one half of the sample. `scale` bounds the penalty so a modest split
/// difference doesn't dominate the score.
fn stability_across_halves(returns: &[f64]) -> f64 {
    if returns.len() < 4 {
        return 1.0;
    }
    let mid = returns.len() / 2;
    let (first, second) = returns.split_at(mid);
    let sharpe_of = |xs: &[f64]| -> f64 {
        let m = xs.iter().sum::<f64>() / xs.len() as f64;
        let v = xs.iter().map(|r| (r - m).powi(2)).sum::<f64>() / xs.len() as f64;
        let sd = v.sqrt();
        if sd > 0.0 {
            m / sd
        } else {
            0.0
        }
    };
    let diff = (sharpe_of(first) - sharpe_of(second)).abs();
    const SCALE: f64 = 2.0;
    (1.0 - (diff / SCALE)).clamp(0.0, 1.0)
}

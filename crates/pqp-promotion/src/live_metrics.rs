//! Reduces a strategy's closed live trades into a recency-weighted
//! [`BacktestResult`]-shaped score (§4.5 step 1). Grounded on
//! `pqp-backtest::metrics::compute`'s reduction (itself grounded on the
//! teacher's `mqk-promotion::evaluator::compute_metrics`), generalised a
//! second time from a replay's `ClosedTrade` list to live `pqp_schemas::Trade`
//! rows, and combined full-vs-recent the way `pqp-backtest::dual_period`/
//! `recency_weight` combine a backtest's two windows.

use pqp_backtest::{recency_weight, RawMetrics};
use pqp_schemas::{BacktestResult, BarInterval, PeriodType, Trade};
use uuid::Uuid;

fn to_f64(d: rust_decimal::Decimal) -> f64 {
    d.to_string().parse().unwrap_or(0.0)
}

fn reduce(returns: &[f64]) -> RawMetrics {
    if returns.is_empty() {
        return RawMetrics::zero();
    }
    let n = returns.len();
    let mean = returns.iter().sum::<f64>() / n as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();
    let sharpe = if std_dev > 0.0 { mean / std_dev } else { 0.0 };
    let wins = returns.iter().filter(|r| **r > 0.0).count();
    let win_rate = wins as f64 / n as f64;
    let total_return = returns.iter().fold(1.0_f64, |acc, r| acc * (1.0 + r)) - 1.0;

    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        let dd = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
        worst = worst.max(dd);
    }

    RawMetrics {
        sharpe,
        win_rate,
        expectancy: mean,
        drawdown: worst,
        trade_count: n as i32,
        total_return,
        walk_forward_stability: if n >= 4 {
            let mid = n / 2;
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
            (1.0 - diff / 2.0).clamp(0.0, 1.0)
        } else {
            1.0
        },
    }
}

/// `None` if `strategy_id` has no closed trades yet — too early to score.
pub fn compute_live_result(
    strategy_id: Uuid,
    trades: &[Trade],
    recent_trade_window: usize,
    recency_max_penalty: f64,
) -> Option<BacktestResult> {
    let returns: Vec<f64> = trades.iter().filter_map(|t| t.realized_pnl_ratio).map(to_f64).collect();
    if returns.is_empty() {
        return None;
    }

    let full = reduce(&returns);
    let start = returns.len().saturating_sub(recent_trade_window);
    let recent = reduce(&returns[start..]);
    let (scale, ratio) = recency_weight(full.sharpe, recent.sharpe, recency_max_penalty);

    let symbols: Vec<String> = {
        let mut s: Vec<String> = trades.iter().map(|t| t.symbol.clone()).collect();
        s.sort();
        s.dedup();
        s
    };

    Some(BacktestResult {
        id: Uuid::new_v4(),
        strategy_id,
        period_type: PeriodType::Recent,
        sharpe: recent.sharpe,
        win_rate: recent.win_rate,
        expectancy: recent.expectancy,
        drawdown: recent.drawdown,
        trade_count: recent.trade_count,
        total_return: recent.total_return,
        walk_forward_stability: recent.walk_forward_stability,
        symbols_tested: symbols,
        bar_interval_tested: BarInterval::H1,
        is_optimal_interval: true,
        weighted_sharpe: recent.sharpe * scale,
        weighted_win_rate: recent.win_rate * scale,
        weighted_expectancy: recent.expectancy * scale,
        recency_ratio: Some(ratio),
        recency_penalty: 1.0 - scale,
        full_result_id: None,
        recent_result_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pqp_schemas::{ExitReason, TradeDirection};
    use rust_decimal::Decimal;

    fn trade(strategy_id: Uuid, pnl_ratio: f64) -> Trade {
        let now = Utc::now();
        Trade {
            id: Uuid::new_v4(),
            strategy_id,
            subaccount_id: Uuid::new_v4(),
            symbol: "BTCUSDT".to_string(),
            direction: TradeDirection::Long,
            entry_time: now,
            entry_price: Decimal::from(100),
            entry_size: Decimal::from(1),
            stop_loss_price: None,
            take_profit_price: None,
            exit_time: Some(now),
            exit_price: Some(Decimal::from(100)),
            exit_reason: Some(ExitReason::SignalClose),
            realized_pnl: Some(Decimal::from(0)),
            realized_pnl_ratio: Some(Decimal::try_from(pnl_ratio).unwrap()),
            leverage: Decimal::from(1),
            entry_fee: Decimal::from(0),
            exit_fee: Some(Decimal::from(0)),
            duration_secs: Some(3600),
            venue_dedup_id: None,
        }
    }

    #[test]
    fn no_closed_trades_yields_none() {
        let strategy_id = Uuid::new_v4();
        assert!(compute_live_result(strategy_id, &[], 10, 0.5).is_none());
    }

    #[test]
    fn winning_streak_scores_above_zero_weighted_expectancy() {
        let strategy_id = Uuid::new_v4();
        let trades: Vec<Trade> = (0..10).map(|_| trade(strategy_id, 0.01)).collect();
        let result = compute_live_result(strategy_id, &trades, 5, 0.5).unwrap();
        assert_eq!(result.trade_count, 5, "recent window caps at the trailing 5 trades");
        assert!(result.weighted_expectancy > 0.0);
    }

    #[test]
    fn recent_decay_relative_to_full_history_is_penalised() {
        let strategy_id = Uuid::new_v4();
        let mut trades: Vec<Trade> = (0..10).map(|_| trade(strategy_id, 0.03)).collect();
        trades.extend((0..10).map(|_| trade(strategy_id, -0.02)));
        let result = compute_live_result(strategy_id, &trades, 10, 0.5).unwrap();
        assert!(result.recency_penalty > 0.0, "a losing recent window after a winning full history should be penalised");
    }
}

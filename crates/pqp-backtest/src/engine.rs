//! One full replay across every symbol a candidate is being tested against,
//! reducing the combined trade list to a single [`RawMetrics`]. This is the
//! one entry point [`crate::sweep::interval_sweep`] and
//! [`crate::dual_period::dual_period`] both parameterise — by interval and
//! by date range respectively — rather than each owning a copy of the loop.

use std::collections::BTreeMap;

use pqp_strategy::{Bar, Strategy};

use crate::metrics;
use crate::replay::run_single_symbol;
use crate::types::RawMetrics;

/// Runs `strategy` against every `(symbol, bars)` pair and reduces the
/// combined closed-trade list into one [`RawMetrics`]. Symbols are walked in
/// a fixed (`BTreeMap`) order so a given `bars_by_symbol` always produces the
/// same trade ordering, regardless of caller-supplied iteration order.
pub fn run(strategy: &dyn Strategy, bars_by_symbol: &BTreeMap<String, Vec<Bar>>) -> RawMetrics {
    let mut trades = Vec::new();
    for (symbol, bars) in bars_by_symbol {
        trades.extend(run_single_symbol(strategy, symbol, bars));
    }
    metrics::compute(&trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqp_schemas::{BarInterval, Direction};
    use pqp_strategy::{IndicatorFrame, PrefixView, Signal, SignalDirection, StopLoss, TakeProfit};

    struct NeverTrades;

    impl Strategy for NeverTrades {
        fn category(&self) -> &str {
            "TEST"
        }
        fn bar_interval(&self) -> BarInterval {
            BarInterval::H1
        }
        fn direction(&self) -> Direction {
            Direction::Bidi
        }
        fn indicator_columns(&self) -> &[&str] {
            &[]
        }
        fn exit_after_bars(&self) -> u32 {
            0
        }
        fn precompute_indicators(&self, _bars: &[Bar]) -> IndicatorFrame {
            IndicatorFrame::new()
        }
        fn generate_signal(&self, _view: PrefixView<'_>, _symbol: Option<&str>) -> Option<Signal> {
            None
        }
    }

    struct OneShotLong;

    impl Strategy for OneShotLong {
        fn category(&self) -> &str {
            "TEST"
        }
        fn bar_interval(&self) -> BarInterval {
            BarInterval::H1
        }
        fn direction(&self) -> Direction {
            Direction::Long
        }
        fn indicator_columns(&self) -> &[&str] {
            &[]
        }
        fn exit_after_bars(&self) -> u32 {
            2
        }
        fn precompute_indicators(&self, _bars: &[Bar]) -> IndicatorFrame {
            IndicatorFrame::new()
        }
        fn generate_signal(&self, view: PrefixView<'_>, _symbol: Option<&str>) -> Option<Signal> {
            if view.len() == 1 {
                Some(Signal::open(SignalDirection::Long, 1.0, StopLoss::Percentage(0.2), TakeProfit::Percentage(0.2), "entry"))
            } else {
                None
            }
        }
    }

    fn bars(n: usize) -> Vec<Bar> {
        (0..n as i64).map(|i| Bar::new(i, 100.0, 101.0, 99.0, 100.0 + i as f64, 1.0)).collect()
    }

    #[test]
    fn a_strategy_that_never_trades_produces_zeroed_metrics() {
        let mut map = BTreeMap::new();
        map.insert("BTC".to_string(), bars(10));
        let m = run(&NeverTrades, &map);
        assert_eq!(m.trade_count, 0);
    }

    #[test]
    fn multi_symbol_run_combines_trades_from_every_symbol() {
        let mut map = BTreeMap::new();
        map.insert("BTC".to_string(), bars(10));
        map.insert("ETH".to_string(), bars(10));
        let m = run(&OneShotLong, &map);
        assert_eq!(m.trade_count, 2);
    }
}

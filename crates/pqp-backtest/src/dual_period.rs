//! Dual-period evaluation (§4.4 step 3): the same bars run twice, once over
//! the full history and once over a trailing window, so the recency weight
//! can compare the two.

use std::collections::BTreeMap;

use pqp_strategy::{Bar, Strategy};

use crate::engine;
use crate::types::RawMetrics;

/// Splits each symbol's bars to its trailing `recent_window_bars`, keeping
/// the full series untouched. A symbol with fewer bars than the window
/// contributes its entire series to the "recent" run as well.
fn trailing_window(bars_by_symbol: &BTreeMap<String, Vec<Bar>>, recent_window_bars: usize) -> BTreeMap<String, Vec<Bar>> {
    bars_by_symbol
        .iter()
        .map(|(symbol, bars)| {
            let start = bars.len().saturating_sub(recent_window_bars);
            (symbol.clone(), bars[start..].to_vec())
        })
        .collect()
}

/// Runs `strategy` over the full history and over the trailing
/// `recent_window_bars` window, returning `(full, recent)`.
pub fn dual_period(strategy: &dyn Strategy, bars_by_symbol: &BTreeMap<String, Vec<Bar>>, recent_window_bars: usize) -> (RawMetrics, RawMetrics) {
    let full = engine::run(strategy, bars_by_symbol);
    let recent_bars = trailing_window(bars_by_symbol, recent_window_bars);
    let recent = engine::run(strategy, &recent_bars);
    (full, recent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqp_schemas::{BarInterval, Direction};
    use pqp_strategy::{IndicatorFrame, PrefixView, Signal, SignalDirection, StopLoss, TakeProfit};

    struct EveryBarLong;

    impl Strategy for EveryBarLong {
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
            1
        }
        fn precompute_indicators(&self, _bars: &[Bar]) -> IndicatorFrame {
            IndicatorFrame::new()
        }
        fn generate_signal(&self, view: PrefixView<'_>, _symbol: Option<&str>) -> Option<Signal> {
            Some(Signal::open(SignalDirection::Long, 1.0, StopLoss::Percentage(0.5), TakeProfit::Percentage(0.5), "entry"))
                .filter(|_| view.row(0).is_some())
        }
    }

    fn bars(n: usize) -> Vec<Bar> {
        (0..n as i64).map(|i| Bar::new(i, 100.0, 101.0, 99.0, 100.0, 1.0)).collect()
    }

    #[test]
    fn recent_window_shorter_than_full_history_trades_fewer_bars() {
        let mut map = BTreeMap::new();
        map.insert("BTC".to_string(), bars(20));
        let (full, recent) = dual_period(&EveryBarLong, &map, 5);
        assert!(full.trade_count >= recent.trade_count);
        assert!(recent.trade_count > 0);
    }

    #[test]
    fn window_wider_than_available_history_falls_back_to_full_series() {
        let mut map = BTreeMap::new();
        map.insert("BTC".to_string(), bars(3));
        let (full, recent) = dual_period(&EveryBarLong, &map, 100);
        assert_eq!(full.trade_count, recent.trade_count);
    }
}

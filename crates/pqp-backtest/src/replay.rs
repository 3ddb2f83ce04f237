//! Vectorised per-symbol replay over a prefix-bounded [`PrefixView`]. One
//! precompute pass, then a single forward walk advancing `last_visible` one
//! bar at a time — no per-bar allocation, no path to a future row.

use pqp_strategy::{Bar, PrefixView, Signal, SignalDirection, StopLoss, Strategy, TakeProfit};

#[derive(Clone, Debug, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub direction: SignalDirection,
    pub entry_idx: usize,
    pub exit_idx: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_ratio: f64,
}

struct OpenPosition {
    direction: SignalDirection,
    entry_idx: usize,
    entry_price: f64,
    stop_price: Option<f64>,
    take_price: Option<f64>,
    exit_after_bars: Option<u32>,
}

/// `pnl_ratio` for closing `direction` at `exit` having entered at `entry`.
fn signed_return(direction: SignalDirection, entry: f64, exit: f64) -> f64 {
    match direction {
        SignalDirection::Short => (entry - exit) / entry,
        _ => (exit - entry) / entry,
    }
}

fn resolve_stop(stop: &StopLoss, direction: SignalDirection, entry: f64, view: &PrefixView<'_>) -> Option<f64> {
    let long = direction == SignalDirection::Long;
    match stop {
        StopLoss::Percentage(pct) if *pct > 0.0 => Some(if long { entry * (1.0 - pct) } else { entry * (1.0 + pct) }),
        StopLoss::Trailing(pct) if *pct > 0.0 => Some(if long { entry * (1.0 - pct) } else { entry * (1.0 + pct) }),
        StopLoss::AtrMultiple(mult) => {
            let atr = view.indicator("atr", 0).unwrap_or(entry * 0.01);
            Some(if long { entry - mult * atr } else { entry + mult * atr })
        }
        StopLoss::VolatilityStdDev(mult) => {
            let sd = view.indicator("stddev", 0).unwrap_or(entry * 0.01);
            Some(if long { entry - mult * sd } else { entry + mult * sd })
        }
        StopLoss::StructuralSwing => {
            let window = view.tail(20.min(view.len()));
            if long {
                window.iter().map(|b| b.low).fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
            } else {
                window.iter().map(|b| b.high).fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            }
        }
        _ => None,
    }
}

fn resolve_take(take: &TakeProfit, direction: SignalDirection, entry: f64, stop_price: Option<f64>, view: &PrefixView<'_>) -> Option<f64> {
    let long = direction == SignalDirection::Long;
    match take {
        TakeProfit::Percentage(pct) if *pct > 0.0 => Some(if long { entry * (1.0 + pct) } else { entry * (1.0 - pct) }),
        TakeProfit::Trailing(pct) if *pct > 0.0 => Some(if long { entry * (1.0 + pct) } else { entry * (1.0 - pct) }),
        TakeProfit::AtrMultiple(mult) => {
            let atr = view.indicator("atr", 0).unwrap_or(entry * 0.01);
            Some(if long { entry + mult * atr } else { entry - mult * atr })
        }
        TakeProfit::RrMultiple(rr) => {
            let risk = stop_price.map(|sp| (entry - sp).abs())?;
            Some(if long { entry + rr * risk } else { entry - rr * risk })
        }
        TakeProfit::Structural => {
            let window = view.tail(20.min(view.len()));
            if long {
                window.iter().map(|b| b.high).fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            } else {
                window.iter().map(|b| b.low).fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
            }
        }
        _ => None,
    }
}

/// Replays `bars` for one `symbol` through `strategy`'s full contract:
/// one `precompute_indicators` pass, then a forward walk calling
/// `generate_signal` against a `PrefixView` advanced one bar at a time.
/// Returns every trade closed during the replay (a position still open at
/// the last bar is dropped, not counted — the run ends at `bars.last()`, not
/// beyond it).
pub fn run_single_symbol(strategy: &dyn Strategy, symbol: &str, bars: &[Bar]) -> Vec<ClosedTrade> {
    if bars.is_empty() {
        return Vec::new();
    }

    let indicators = strategy.precompute_indicators(bars);
    let mut trades = Vec::new();
    let mut open: Option<OpenPosition> = None;

    for i in 0..bars.len() {
        let view = PrefixView::new(bars, &indicators, i);
        let bar = &bars[i];

        if let Some(pos) = &open {
            let bars_held = (i - pos.entry_idx) as u32;
            let hit_stop = pos
                .stop_price
                .map(|sl| if pos.direction == SignalDirection::Long { bar.low <= sl } else { bar.high >= sl })
                .unwrap_or(false);
            let hit_take = pos
                .take_price
                .map(|tp| if pos.direction == SignalDirection::Long { bar.high >= tp } else { bar.low <= tp })
                .unwrap_or(false);
            let time_exit = pos.exit_after_bars.map(|n| n > 0 && bars_held >= n).unwrap_or(false);

            if hit_stop || hit_take || time_exit {
                let exit_price = if hit_stop {
                    pos.stop_price.unwrap()
                } else if hit_take {
                    pos.take_price.unwrap()
                } else {
                    bar.close
                };
                trades.push(close(&open.take().unwrap(), symbol, i, exit_price));
                continue;
            }
        }

        let Some(signal) = strategy.generate_signal(view, Some(symbol)) else {
            continue;
        };

        match (&open, signal.direction) {
            (Some(_), SignalDirection::Close) => {
                trades.push(close(&open.take().unwrap(), symbol, i, bar.close));
            }
            (None, SignalDirection::Long) | (None, SignalDirection::Short) => {
                let entry = bar.close;
                let stop_price = resolve_stop(&signal.stop_loss, signal.direction, entry, &view);
                let take_price = resolve_take(&signal.take_profit, signal.direction, entry, stop_price, &view);
                open = Some(OpenPosition {
                    direction: signal.direction,
                    entry_idx: i,
                    entry_price: entry,
                    stop_price,
                    take_price,
                    exit_after_bars: signal.exit_after_bars,
                });
            }
            _ => {}
        }
    }

    trades
}

fn close(pos: &OpenPosition, symbol: &str, exit_idx: usize, exit_price: f64) -> ClosedTrade {
    ClosedTrade {
        symbol: symbol.to_string(),
        direction: pos.direction,
        entry_idx: pos.entry_idx,
        exit_idx,
        entry_price: pos.entry_price,
        exit_price,
        pnl_ratio: signed_return(pos.direction, pos.entry_price, exit_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqp_schemas::{BarInterval, Direction};
    use pqp_strategy::IndicatorFrame;

    struct AlwaysLongOnce;

    impl Strategy for AlwaysLongOnce {
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
            3
        }
        fn precompute_indicators(&self, _bars: &[Bar]) -> IndicatorFrame {
            IndicatorFrame::new()
        }
        fn generate_signal(&self, view: PrefixView<'_>, _symbol: Option<&str>) -> Option<Signal> {
            if view.len() == 1 {
                Some(Signal::open(
                    SignalDirection::Long,
                    1.0,
                    StopLoss::Percentage(0.5),
                    TakeProfit::Percentage(0.5),
                    "entry",
                ))
            } else {
                None
            }
        }
    }

    fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
        (0..n as i64).map(|i| Bar::new(i, price, price, price, price, 1.0)).collect()
    }

    #[test]
    fn time_exit_closes_after_declared_bar_count() {
        let bars = flat_bars(10, 100.0);
        let trades = run_single_symbol(&AlwaysLongOnce, "BTC", &bars);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_idx, 0);
        assert_eq!(trades[0].exit_idx, 3);
    }

    #[test]
    fn empty_series_produces_no_trades() {
        assert!(run_single_symbol(&AlwaysLongOnce, "BTC", &[]).is_empty());
    }
}

use std::collections::HashMap;

/// One OHLCV bar. `end_ts` is the bar's closing epoch second, the same
/// field `pqp-db::md` stores bars against.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub end_ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(end_ts: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            end_ts,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Indicator columns produced by [`crate::Strategy::precompute_indicators`],
/// one `f64` per bar per column, aligned index-for-index with the input
/// series. A strategy declares the column names it writes via
/// [`crate::Strategy::indicator_columns`]; this is just the storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndicatorFrame {
    columns: HashMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// A read-only, prefix-bounded view over a bar series plus its precomputed
/// indicator columns. `last_visible` is the highest index a caller may read;
/// every accessor takes an `offset_from_end` and returns `None` once that
/// would reach past `last_visible`, so there is no path to future data —
/// the prefix-only contract (§6/§9) is structural, not a runtime check on
/// the caller's behaviour.
#[derive(Clone, Copy)]
pub struct PrefixView<'a> {
    bars: &'a [Bar],
    indicators: &'a IndicatorFrame,
    last_visible: usize,
}

impl<'a> PrefixView<'a> {
    /// `last_visible` must be a valid index into `bars`; this is the cursor
    /// position the vectorised replay loop advances one bar at a time.
    pub fn new(bars: &'a [Bar], indicators: &'a IndicatorFrame, last_visible: usize) -> Self {
        assert!(last_visible < bars.len(), "last_visible out of range");
        Self {
            bars,
            indicators,
            last_visible,
        }
    }

    /// Number of bars visible to this view (`last_visible + 1`).
    pub fn len(&self) -> usize {
        self.last_visible + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The current bar (`offset_from_end == 0`), the `iloc[-1]` analogue.
    pub fn last(&self) -> &Bar {
        &self.bars[self.last_visible]
    }

    /// `offset_from_end` bars back from the current one; `row(0)` is
    /// [`PrefixView::last`]. Returns `None` once the offset would reach
    /// before the start of the visible prefix.
    pub fn row(&self, offset_from_end: usize) -> Option<&Bar> {
        if offset_from_end > self.last_visible {
            return None;
        }
        self.bars.get(self.last_visible - offset_from_end)
    }

    /// The last `n` visible bars, oldest first (`iloc[-N:]` analogue).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let n = n.min(self.len());
        &self.bars[self.last_visible + 1 - n..=self.last_visible]
    }

    pub fn indicator(&self, name: &str, offset_from_end: usize) -> Option<f64> {
        if offset_from_end > self.last_visible {
            return None;
        }
        self.indicators
            .get(name)
            .and_then(|col| col.get(self.last_visible - offset_from_end))
            .copied()
    }
}

/// Direction a [`Signal`] asks the Executor to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalDirection {
    Long,
    Short,
    Close,
}

/// Stop-loss descriptor a strategy attaches to an opening signal. Order
/// placement itself is out of scope (§1 Non-goals) — this is just the
/// declared intent the Executor's sizing/bracket logic consumes.
#[derive(Clone, Debug, PartialEq)]
pub enum StopLoss {
    Percentage(f64),
    AtrMultiple(f64),
    StructuralSwing,
    VolatilityStdDev(f64),
    Trailing(f64),
}

/// Take-profit descriptor, same role as [`StopLoss`].
#[derive(Clone, Debug, PartialEq)]
pub enum TakeProfit {
    Percentage(f64),
    RrMultiple(f64),
    AtrMultiple(f64),
    Structural,
    Trailing(f64),
}

/// A single per-bar decision from [`crate::Strategy::generate_signal`].
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub direction: SignalDirection,
    pub leverage: f64,
    pub stop_loss: StopLoss,
    pub take_profit: TakeProfit,
    pub exit_after_bars: Option<u32>,
    pub reason: String,
}

impl Signal {
    pub fn open(
        direction: SignalDirection,
        leverage: f64,
        stop_loss: StopLoss,
        take_profit: TakeProfit,
        reason: impl Into<String>,
    ) -> Self {
        debug_assert!(direction != SignalDirection::Close, "use Signal::close for exits");
        Self {
            direction,
            leverage,
            stop_loss,
            take_profit,
            exit_after_bars: None,
            reason: reason.into(),
        }
    }

    pub fn close(reason: impl Into<String>) -> Self {
        Self {
            direction: SignalDirection::Close,
            leverage: 0.0,
            stop_loss: StopLoss::Percentage(0.0),
            take_profit: TakeProfit::Percentage(0.0),
            exit_after_bars: None,
            reason: reason.into(),
        }
    }

    pub fn with_exit_after_bars(mut self, bars: u32) -> Self {
        self.exit_after_bars = Some(bars);
        self
    }
}

/// The strategy contract (§6): declared identity plus the two-phase
/// vectorised evaluation (full-series precompute, then prefix-bounded
/// per-bar signal). Implementations are expected to be stateless aside
/// from their declared params — `precompute_indicators` is a pure function
/// of the input series.
pub trait Strategy: Send + Sync {
    fn category(&self) -> &str;
    fn bar_interval(&self) -> pqp_schemas::BarInterval;
    fn direction(&self) -> pqp_schemas::Direction;
    /// Indicator column names this strategy writes during precompute.
    fn indicator_columns(&self) -> &[&str];
    /// `0` disables the time-based exit.
    fn exit_after_bars(&self) -> u32;

    /// One-time pass over the full series. Must not read past the row it
    /// is computing for (prefix-preserving), even though the whole slice
    /// is visible here — no per-bar decision may depend on this function
    /// having seen later rows than the index it fills in.
    fn precompute_indicators(&self, bars: &[Bar]) -> IndicatorFrame;

    /// Per-bar entry point. `symbol` is `None` for single-symbol strategies.
    fn generate_signal(&self, view: PrefixView<'_>, symbol: Option<&str>) -> Option<Signal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n as i64)
            .map(|i| Bar::new(i, 1.0 + i as f64, 2.0 + i as f64, 0.0 + i as f64, 1.5 + i as f64, 100.0))
            .collect()
    }

    #[test]
    fn prefix_view_row_zero_is_last() {
        let bars = bars(5);
        let ind = IndicatorFrame::new();
        let view = PrefixView::new(&bars, &ind, 4);
        assert_eq!(view.row(0).unwrap().end_ts, 4);
        assert_eq!(view.last().end_ts, 4);
    }

    #[test]
    fn prefix_view_cannot_reach_past_last_visible() {
        let bars = bars(5);
        let ind = IndicatorFrame::new();
        let view = PrefixView::new(&bars, &ind, 2);
        assert_eq!(view.len(), 3);
        assert_eq!(view.row(2).unwrap().end_ts, 0);
        assert!(view.row(3).is_none(), "offset past the window must be None, never future data");
    }

    #[test]
    fn prefix_view_tail_returns_oldest_first() {
        let bars = bars(5);
        let ind = IndicatorFrame::new();
        let view = PrefixView::new(&bars, &ind, 4);
        let t = view.tail(3);
        assert_eq!(t.iter().map(|b| b.end_ts).collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn indicator_lookup_respects_same_bound_as_row() {
        let bars = bars(3);
        let mut ind = IndicatorFrame::new();
        ind.insert("sma", vec![10.0, 20.0, 30.0]);
        let view = PrefixView::new(&bars, &ind, 1);
        assert_eq!(view.indicator("sma", 0), Some(20.0));
        assert_eq!(view.indicator("sma", 1), Some(10.0));
        assert_eq!(view.indicator("sma", 2), None);
    }
}

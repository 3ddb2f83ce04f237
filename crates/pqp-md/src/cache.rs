//! `CandleCache` (§4.7): the Executor tick loop's only read path onto price
//! history. Populated by `push::PushClient::subscribe_candles` updates and
//! by the HTTP bootstrap (`HistoricalProvider::fetch_bars`); never read
//! from over HTTP on the per-tick path itself.

use std::collections::HashMap;

use pqp_schemas::BarInterval;
use pqp_strategy::{Bar, IndicatorFrame, PrefixView};

#[derive(Default)]
pub struct CandleCache {
    series: HashMap<(String, BarInterval), Vec<Bar>>,
}

impl CandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one bar's worth of bootstrap or push history. Bars are kept
    /// in arrival order; it is the caller's job (bootstrap/push source) to
    /// hand them over in chronological order.
    pub fn push_bar(&mut self, symbol: &str, interval: BarInterval, bar: Bar) {
        self.series.entry((symbol.to_string(), interval)).or_default().push(bar);
    }

    pub fn len(&self, symbol: &str, interval: BarInterval) -> usize {
        self.series.get(&(symbol.to_string(), interval)).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, symbol: &str, interval: BarInterval) -> bool {
        self.len(symbol, interval) == 0
    }

    pub fn bars(&self, symbol: &str, interval: BarInterval) -> &[Bar] {
        self.series.get(&(symbol.to_string(), interval)).map_or(&[], Vec::as_slice)
    }

    /// A prefix view over every bar currently cached for `(symbol,
    /// interval)`, `None` until at least one bar has arrived. `indicators`
    /// is computed by the caller (it needs the concrete `Strategy` impl,
    /// which this crate doesn't know about) and must be aligned index-for-
    /// index with [`CandleCache::bars`].
    pub fn prefix_view<'a>(&'a self, symbol: &str, interval: BarInterval, indicators: &'a IndicatorFrame) -> Option<PrefixView<'a>> {
        let bars = self.bars(symbol, interval);
        if bars.is_empty() {
            return None;
        }
        Some(PrefixView::new(bars, indicators, bars.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(end_ts: i64, close: f64) -> Bar {
        Bar::new(end_ts, close, close, close, close, 1.0)
    }

    #[test]
    fn empty_cache_has_no_prefix_view() {
        let cache = CandleCache::new();
        let indicators = IndicatorFrame::new();
        assert!(cache.prefix_view("BTCUSDT", BarInterval::M5, &indicators).is_none());
    }

    #[test]
    fn pushed_bars_accumulate_in_arrival_order() {
        let mut cache = CandleCache::new();
        cache.push_bar("BTCUSDT", BarInterval::M5, bar(1, 100.0));
        cache.push_bar("BTCUSDT", BarInterval::M5, bar(2, 101.0));

        assert_eq!(cache.len("BTCUSDT", BarInterval::M5), 2);
        let indicators = IndicatorFrame::new();
        let view = cache.prefix_view("BTCUSDT", BarInterval::M5, &indicators).unwrap();
        assert_eq!(view.last().close, 101.0);
    }

    #[test]
    fn distinct_symbols_and_intervals_do_not_share_history() {
        let mut cache = CandleCache::new();
        cache.push_bar("BTCUSDT", BarInterval::M5, bar(1, 100.0));
        cache.push_bar("ETHUSDT", BarInterval::M5, bar(1, 50.0));
        cache.push_bar("BTCUSDT", BarInterval::M15, bar(1, 200.0));

        assert_eq!(cache.len("BTCUSDT", BarInterval::M5), 1);
        assert_eq!(cache.len("ETHUSDT", BarInterval::M5), 1);
        assert_eq!(cache.len("BTCUSDT", BarInterval::M15), 1);
    }
}

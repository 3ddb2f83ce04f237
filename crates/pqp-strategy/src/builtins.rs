//! Built-in strategy templates compiled into the binary (§9's "satisfy the
//! contract statically" option — this system registers every strategy at
//! build time rather than JIT-compiling source fetched from the database).

use crate::{Bar, IndicatorFrame, PrefixView, Signal, SignalDirection, StopLoss, Strategy, TakeProfit};
use pqp_schemas::{BarInterval, Direction};

fn sma(bars: &[Bar], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; bars.len()];
    for i in 0..bars.len() {
        if i + 1 >= window {
            let slice = &bars[i + 1 - window..=i];
            out[i] = slice.iter().map(|b| b.close).sum::<f64>() / window as f64;
        }
    }
    out
}

/// A simple dual-moving-average crossover, long above / short below.
/// Grounded on the crossover family under `original_source/strategies/pool`
/// (e.g. `PtaStrat_CRS_*`), re-expressed as a Rust `Strategy` rather than
/// ported from its pandas implementation.
pub struct MovingAverageCross {
    fast: usize,
    slow: usize,
}

impl MovingAverageCross {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast < slow, "fast window must be shorter than slow window");
        Self { fast, slow }
    }

    pub fn from_params(params: Option<&serde_json::Value>) -> Self {
        let fast = params
            .and_then(|p| p.get("fast"))
            .and_then(|v| v.as_u64())
            .unwrap_or(10) as usize;
        let slow = params
            .and_then(|p| p.get("slow"))
            .and_then(|v| v.as_u64())
            .unwrap_or(30) as usize;
        Self::new(fast, slow)
    }
}

impl Strategy for MovingAverageCross {
    fn category(&self) -> &str {
        "MOM"
    }

    fn bar_interval(&self) -> BarInterval {
        BarInterval::H1
    }

    fn direction(&self) -> Direction {
        Direction::Bidi
    }

    fn indicator_columns(&self) -> &[&str] {
        &["sma_fast", "sma_slow"]
    }

    fn exit_after_bars(&self) -> u32 {
        0
    }

    fn precompute_indicators(&self, bars: &[Bar]) -> IndicatorFrame {
        let mut frame = IndicatorFrame::new();
        frame.insert("sma_fast", sma(bars, self.fast));
        frame.insert("sma_slow", sma(bars, self.slow));
        frame
    }

    fn generate_signal(&self, view: PrefixView<'_>, _symbol: Option<&str>) -> Option<Signal> {
        let fast_now = view.indicator("sma_fast", 0)?;
        let slow_now = view.indicator("sma_slow", 0)?;
        let fast_prev = view.indicator("sma_fast", 1)?;
        let slow_prev = view.indicator("sma_slow", 1)?;

        if fast_prev <= slow_prev && fast_now > slow_now {
            Some(Signal::open(
                SignalDirection::Long,
                1.0,
                StopLoss::Percentage(0.02),
                TakeProfit::RrMultiple(2.0),
                "sma_fast crossed above sma_slow",
            ))
        } else if fast_prev >= slow_prev && fast_now < slow_now {
            Some(Signal::open(
                SignalDirection::Short,
                1.0,
                StopLoss::Percentage(0.02),
                TakeProfit::RrMultiple(2.0),
                "sma_fast crossed below sma_slow",
            ))
        } else {
            None
        }
    }
}

/// Registers every built-in template into a fresh [`crate::StrategyRegistry`].
pub fn register_builtins(registry: &mut crate::StrategyRegistry) {
    registry
        .register(
            crate::StrategyMeta::new("ma_cross", "MOM", "dual moving-average crossover"),
            |params| Box::new(MovingAverageCross::from_params(params)),
        )
        .expect("builtin names are unique by construction");
}

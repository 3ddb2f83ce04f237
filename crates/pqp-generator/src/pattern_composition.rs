//! Pattern composition (§4.2): candidates built from Andrea Unger's 60
//! price-action patterns, composed 2-3 at a time into a pattern-aware
//! template's `params["patterns"]` array rather than reimplementing each
//! pattern's boolean condition here — that belongs to the template itself at
//! backtest time. This module only owns the taxonomy and the composition.

use anyhow::Result;
use pqp_schemas::Direction;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::source::{CandidateDraft, CandidateSource, RemainingBudget};

/// One of the 60 Unger patterns, grouped into the categories they fall in.
/// Patterns 44-49 are reserved and have no variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UngerPattern {
    SmallBar,
    SmallBody,
    NarrowRange,
    RangeExpansionUp,
    RangeExpansionDown,
    WideRangeBar,
    BreakoutBar,
    ThreeUpCloses,
    ThreeDownCloses,
    HigherHighHigherLow,
    LowerHighLowerLow,
    RangeContraction2Bars,
    RangeExpansion2Bars,
    CloseAboveOpen,
    CloseBelowOpen,
    CloseUpperQuartile,
    CloseLowerQuartile,
    GapUp,
    GapDown,
    GapFilledUp,
    GapFilledDown,
    InsideDay,
    OutsideDay,
    InsideDayBreakoutUp,
    InsideDayBreakoutDown,
    OutsideDayBullish,
    OutsideDayBearish,
    ThreeBarInsideCompression,
    GapAndGo,
    FailedBreakoutReversal,
    DoubleInsideDay,
    Crypto7DayExtensionUp,
    Crypto7DayExtensionDown,
    Crypto7DayExhaustion,
    HammerReversal,
    ShootingStarReversal,
    BullishEngulfing,
    BearishEngulfing,
    DojiReversal,
    VolumeClimaxUp,
    VolumeClimaxDown,
    VolumeDryUp,
    Nr4,
    Nr7,
    WideRangeDay,
    HigherLowStructureBreak,
    LowerHighStructureBreak,
    DoubleTopReversal,
    DoubleBottomReversal,
    TrendExhaustionReversal,
    KeyReversalBar,
}

impl UngerPattern {
    /// Category band the pattern falls in, per the library's own grouping.
    pub fn category(self) -> PatternCategory {
        use PatternCategory::*;
        use UngerPattern::*;
        match self {
            SmallBar | SmallBody | NarrowRange => VolatilityIndecision,
            RangeExpansionUp | RangeExpansionDown | WideRangeBar | BreakoutBar => DirectionalExpansion,
            ThreeUpCloses | ThreeDownCloses => ConsecutiveCloses,
            HigherHighHigherLow | LowerHighLowerLow => Structure,
            RangeContraction2Bars | RangeExpansion2Bars => RangeChange,
            CloseAboveOpen | CloseBelowOpen | CloseUpperQuartile | CloseLowerQuartile | GapUp | GapDown | GapFilledUp | GapFilledDown => ClosePositionGap,
            InsideDay | OutsideDay | InsideDayBreakoutUp | InsideDayBreakoutDown | OutsideDayBullish | OutsideDayBearish | ThreeBarInsideCompression | GapAndGo | FailedBreakoutReversal | DoubleInsideDay => InsideOutsideGap,
            Crypto7DayExtensionUp | Crypto7DayExtensionDown | Crypto7DayExhaustion => Crypto7DayExtension,
            HammerReversal | ShootingStarReversal | BullishEngulfing | BearishEngulfing | DojiReversal => CandlestickReversal,
            VolumeClimaxUp | VolumeClimaxDown | VolumeDryUp => Volume,
            Nr4 | Nr7 | WideRangeDay => RangeExtreme,
            HigherLowStructureBreak | LowerHighStructureBreak | DoubleTopReversal | DoubleBottomReversal | TrendExhaustionReversal | KeyReversalBar => StructureReversal,
        }
    }

    /// Whether this pattern reads as a bullish, bearish, or neutral signal,
    /// used so a composition doesn't mix patterns that contradict a
    /// candidate's assigned direction.
    pub fn bias(self) -> Option<Direction> {
        use UngerPattern::*;
        match self {
            RangeExpansionUp | ThreeUpCloses | HigherHighHigherLow | CloseAboveOpen | CloseUpperQuartile | GapUp | GapFilledUp | InsideDayBreakoutUp | OutsideDayBullish | GapAndGo | DoubleBottomReversal
            | Crypto7DayExtensionDown // an extension down exhausts sellers, bullish reversal read
            | HammerReversal | BullishEngulfing | VolumeClimaxDown | HigherLowStructureBreak => Some(Direction::Long),
            RangeExpansionDown | ThreeDownCloses | LowerHighLowerLow | CloseBelowOpen | CloseLowerQuartile | GapDown | GapFilledDown | InsideDayBreakoutDown | OutsideDayBearish | FailedBreakoutReversal | DoubleTopReversal
            | Crypto7DayExtensionUp
            | ShootingStarReversal | BearishEngulfing | VolumeClimaxUp | LowerHighStructureBreak => Some(Direction::Short),
            _ => None,
        }
    }

    fn all() -> &'static [UngerPattern] {
        use UngerPattern::*;
        &[
            SmallBar, SmallBody, NarrowRange, RangeExpansionUp, RangeExpansionDown, WideRangeBar, BreakoutBar,
            ThreeUpCloses, ThreeDownCloses, HigherHighHigherLow, LowerHighLowerLow, RangeContraction2Bars,
            RangeExpansion2Bars, CloseAboveOpen, CloseBelowOpen, CloseUpperQuartile, CloseLowerQuartile, GapUp,
            GapDown, GapFilledUp, GapFilledDown, InsideDay, OutsideDay, InsideDayBreakoutUp, InsideDayBreakoutDown,
            OutsideDayBullish, OutsideDayBearish, ThreeBarInsideCompression, GapAndGo, FailedBreakoutReversal,
            DoubleInsideDay, Crypto7DayExtensionUp, Crypto7DayExtensionDown, Crypto7DayExhaustion, HammerReversal,
            ShootingStarReversal, BullishEngulfing, BearishEngulfing, DojiReversal, VolumeClimaxUp, VolumeClimaxDown,
            VolumeDryUp, Nr4, Nr7, WideRangeDay, HigherLowStructureBreak, LowerHighStructureBreak, DoubleTopReversal,
            DoubleBottomReversal, TrendExhaustionReversal, KeyReversalBar,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternCategory {
    VolatilityIndecision,
    DirectionalExpansion,
    ConsecutiveCloses,
    Structure,
    RangeChange,
    ClosePositionGap,
    InsideOutsideGap,
    Crypto7DayExtension,
    CandlestickReversal,
    Volume,
    RangeExtreme,
    StructureReversal,
}

/// Draws 2-3 patterns compatible with a candidate's direction and stamps
/// them into `params["patterns"]` for the named pattern-aware template.
pub struct PatternComposition<R: Rng> {
    template_name: String,
    symbols: Vec<String>,
    direction: Direction,
    compositions_per_call: u32,
    rng: R,
}

impl<R: Rng> PatternComposition<R> {
    pub fn new(template_name: impl Into<String>, symbols: Vec<String>, direction: Direction, compositions_per_call: u32, rng: R) -> Self {
        Self {
            template_name: template_name.into(),
            symbols,
            direction,
            compositions_per_call,
            rng,
        }
    }

    fn compatible_pool(&self) -> Vec<UngerPattern> {
        UngerPattern::all()
            .iter()
            .copied()
            .filter(|p| match p.bias() {
                None => true,
                Some(b) => b == self.direction || self.direction == Direction::Bidi,
            })
            .collect()
    }

    fn compose_one(&mut self) -> Option<Vec<UngerPattern>> {
        let pool = self.compatible_pool();
        if pool.len() < 2 {
            return None;
        }
        let k = self.rng.gen_range(2..=3.min(pool.len()));
        let mut chosen: Vec<UngerPattern> = pool.choose_multiple(&mut self.rng, k).copied().collect();
        chosen.sort();
        Some(chosen)
    }
}

impl<R: Rng + Send + Sync> CandidateSource for PatternComposition<R> {
    fn name(&self) -> &'static str {
        "pattern_composition"
    }

    fn generate(&mut self, budget: &mut RemainingBudget) -> Result<Vec<CandidateDraft>> {
        let want = self.compositions_per_call.min(budget.daily_remaining);
        let mut drafts = Vec::with_capacity(want as usize);

        for _ in 0..want {
            let Some(patterns) = self.compose_one() else { break };
            budget.take(1);
            drafts.push(CandidateDraft {
                template_name: self.template_name.clone(),
                params: Some(serde_json::json!({ "patterns": patterns })),
                symbols: self.symbols.clone(),
                direction: self.direction,
                source_label: self.name(),
                template_id: None,
            });
        }

        Ok(drafts)
    }
}

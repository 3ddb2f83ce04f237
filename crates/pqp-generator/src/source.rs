//! The `CandidateSource` contract (§4.2) every synthesis strategy
//! implements, and the draft value it produces — a reference to an
//! already-registered `pqp_strategy` template plus the params/symbols to
//! instantiate it with. No source ever hands back compiled code: strategies
//! are registered at build time (§9 Open Question, resolved in DESIGN.md),
//! so "generating a candidate" means picking a template and tuning it.

use anyhow::Result;
use pqp_schemas::Direction;
use uuid::Uuid;

/// One proposed strategy instantiation, not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateDraft {
    /// Name registered in `pqp_strategy::StrategyRegistry`.
    pub template_name: String,
    pub params: Option<serde_json::Value>,
    pub symbols: Vec<String>,
    /// The direction rotation assigned this candidate, stamped into
    /// `params["direction"]` by the caller before instantiation so a
    /// direction-aware template can read its assignment back out.
    pub direction: Direction,
    /// Which `CandidateSource` produced this draft, stored verbatim on the
    /// persisted row's `source` column.
    pub source_label: &'static str,
    /// Groups every draft expanded from the same template together;
    /// `None` for one-off sources that have no shared lineage to track.
    pub template_id: Option<Uuid>,
}

/// Remaining daily synthesis capacity, threaded through every source so a
/// source can produce fewer candidates (or none) once it runs low rather
/// than overshooting and relying on the caller to discard the surplus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemainingBudget {
    pub daily_remaining: u32,
}

impl RemainingBudget {
    pub fn take(&mut self, n: u32) -> u32 {
        let taken = n.min(self.daily_remaining);
        self.daily_remaining -= taken;
        taken
    }

    pub fn is_exhausted(&self) -> bool {
        self.daily_remaining == 0
    }
}

/// A strategy-candidate synthesis method (§4.2): `DirectSynthesis`,
/// `ParametricExpansion`, `EvolutionaryRecombination`, `PatternComposition`.
pub trait CandidateSource: Send + Sync {
    /// Stable label stamped onto every draft this source produces.
    fn name(&self) -> &'static str;

    /// Produces as many drafts as the source sees fit this call, consuming
    /// from `budget` as it goes. Returning an empty `Vec` (not an error) is
    /// the normal "nothing to do right now" outcome.
    fn generate(&mut self, budget: &mut RemainingBudget) -> Result<Vec<CandidateDraft>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_budget_take_is_bounded_by_what_is_left() {
        let mut budget = RemainingBudget { daily_remaining: 3 };
        assert_eq!(budget.take(10), 3);
        assert!(budget.is_exhausted());
        assert_eq!(budget.take(1), 0);
    }
}

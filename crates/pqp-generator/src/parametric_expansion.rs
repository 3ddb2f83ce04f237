//! Parametric expansion (§4.2): the full cross-product over a template's
//! parameter grid, deduplicated in-process by `param_hash` so a single
//! long-running generator never re-enqueues a combination it already
//! produced this run (§8's idempotence law). Cross-process/cross-restart
//! duplicates are caught downstream by `base_code_hash` uniqueness.

use std::collections::BTreeSet;

use anyhow::Result;
use pqp_schemas::Direction;
use pqp_strategy::{param_hash, ParamGrid};
use uuid::Uuid;

use crate::source::{CandidateDraft, CandidateSource, RemainingBudget};

pub struct ParametricExpansion {
    template_name: String,
    template_id: Uuid,
    grid: ParamGrid,
    symbols: Vec<String>,
    direction: Direction,
    seen: BTreeSet<u64>,
    combos: Vec<serde_json::Value>,
    next_combo: usize,
}

impl ParametricExpansion {
    pub fn new(template_name: impl Into<String>, grid: ParamGrid, symbols: Vec<String>, direction: Direction) -> Self {
        let template_name = template_name.into();
        let template_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, template_name.as_bytes());
        let combos = grid.expand();
        Self {
            template_name,
            template_id,
            grid,
            symbols,
            direction,
            seen: BTreeSet::new(),
            combos,
            next_combo: 0,
        }
    }

    /// Number of combinations in the grid not yet produced this run.
    pub fn remaining_combos(&self) -> usize {
        self.combos.len().saturating_sub(self.next_combo)
    }
}

impl CandidateSource for ParametricExpansion {
    fn name(&self) -> &'static str {
        "parametric_expansion"
    }

    fn generate(&mut self, budget: &mut RemainingBudget) -> Result<Vec<CandidateDraft>> {
        let mut drafts = Vec::new();

        while self.next_combo < self.combos.len() {
            if budget.is_exhausted() {
                break;
            }
            let params = self.combos[self.next_combo].clone();
            self.next_combo += 1;

            if !self.seen.insert(param_hash(&params)) {
                continue;
            }

            budget.take(1);
            drafts.push(CandidateDraft {
                template_name: self.template_name.clone(),
                params: Some(params),
                symbols: self.symbols.clone(),
                direction: self.direction,
                source_label: self.name(),
                template_id: Some(self.template_id),
            });
        }

        // Grid exhausted: re-expand for the next call (templates may have
        // new axes registered between generator restarts).
        if self.next_combo >= self.combos.len() {
            self.combos = self.grid.expand();
            self.next_combo = 0;
        }

        Ok(drafts)
    }
}

//! Evolutionary recombination (§4.2): crossover two well-performing parent
//! strategies' param sets key-by-key, with a small chance of mutating each
//! numeric value afterward. Parents are supplied by the caller (typically
//! the current `Live`/`Selected` pool) rather than fetched here — this
//! source has no database handle, only the snapshot it was built with.

use std::collections::BTreeMap;

use anyhow::Result;
use pqp_schemas::Direction;
use rand::Rng;
use serde_json::Value;

use crate::source::{CandidateDraft, CandidateSource, RemainingBudget};

/// A candidate parent: the template it instantiates plus its tuned params.
#[derive(Clone, Debug, PartialEq)]
pub struct Parent {
    pub template_name: String,
    pub params: Value,
}

pub struct EvolutionaryRecombination<R: Rng> {
    parents: Vec<Parent>,
    symbols: Vec<String>,
    direction: Direction,
    mutation_rate: f64,
    children_per_call: u32,
    rng: R,
}

impl<R: Rng> EvolutionaryRecombination<R> {
    pub fn new(parents: Vec<Parent>, symbols: Vec<String>, direction: Direction, mutation_rate: f64, children_per_call: u32, rng: R) -> Self {
        Self {
            parents,
            symbols,
            direction,
            mutation_rate,
            children_per_call,
            rng,
        }
    }

    /// Parents sharing `template_name`, grouped so crossover only ever
    /// combines two instances of the same underlying template.
    fn families(&self) -> BTreeMap<&str, Vec<&Parent>> {
        let mut out: BTreeMap<&str, Vec<&Parent>> = BTreeMap::new();
        for p in &self.parents {
            out.entry(p.template_name.as_str()).or_default().push(p);
        }
        out
    }

    fn crossover(&mut self, a: &Value, b: &Value) -> Value {
        let (Value::Object(a), Value::Object(b)) = (a, b) else {
            return a.clone();
        };
        let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
        keys.sort();
        keys.dedup();

        let mut child = serde_json::Map::new();
        for key in keys {
            let chosen = if self.rng.gen_bool(0.5) { a.get(key) } else { b.get(key) }
                .or_else(|| a.get(key))
                .or_else(|| b.get(key))
                .cloned()
                .unwrap_or(Value::Null);
            child.insert(key.clone(), self.maybe_mutate(chosen));
        }
        Value::Object(child)
    }

    fn maybe_mutate(&mut self, v: Value) -> Value {
        let Some(n) = v.as_f64() else { return v };
        if !self.rng.gen_bool(self.mutation_rate) {
            return v;
        }
        let factor = self.rng.gen_range(0.9..=1.1);
        let mutated = n * factor;
        if v.is_i64() || v.is_u64() {
            serde_json::json!(mutated.round() as i64)
        } else {
            serde_json::json!(mutated)
        }
    }
}

impl<R: Rng + Send + Sync> CandidateSource for EvolutionaryRecombination<R> {
    fn name(&self) -> &'static str {
        "evolutionary_recombination"
    }

    fn generate(&mut self, budget: &mut RemainingBudget) -> Result<Vec<CandidateDraft>> {
        let families = self.families();
        let eligible: Vec<(String, Vec<Value>)> = families
            .into_iter()
            .filter(|(_, ps)| ps.len() >= 2)
            .map(|(name, ps)| (name.to_string(), ps.into_iter().map(|p| p.params.clone()).collect()))
            .collect();

        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        let want = self.children_per_call.min(budget.daily_remaining);
        let mut drafts = Vec::with_capacity(want as usize);

        for i in 0..want {
            let (template_name, param_pool) = &eligible[i as usize % eligible.len()];
            if param_pool.len() < 2 {
                continue;
            }
            let a_idx = self.rng.gen_range(0..param_pool.len());
            let mut b_idx = self.rng.gen_range(0..param_pool.len());
            if b_idx == a_idx {
                b_idx = (b_idx + 1) % param_pool.len();
            }
            let child_params = self.crossover(&param_pool[a_idx].clone(), &param_pool[b_idx].clone());
            budget.take(1);
            drafts.push(CandidateDraft {
                template_name: template_name.clone(),
                params: Some(child_params),
                symbols: self.symbols.clone(),
                direction: self.direction,
                source_label: self.name(),
                template_id: None,
            });
        }

        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn parents() -> Vec<Parent> {
        vec![
            Parent { template_name: "ma_cross".to_string(), params: json!({"fast": 8, "slow": 20}) },
            Parent { template_name: "ma_cross".to_string(), params: json!({"fast": 12, "slow": 30}) },
        ]
    }

    #[test]
    fn crossover_child_params_are_drawn_from_either_parent() {
        let rng = ChaCha8Rng::seed_from_u64(7);
        let mut source = EvolutionaryRecombination::new(parents(), vec!["BTC".to_string()], Direction::Bidi, 0.0, 3, rng);
        let mut budget = RemainingBudget { daily_remaining: 10 };
        let drafts = source.generate(&mut budget).unwrap();
        assert_eq!(drafts.len(), 3);
        for d in &drafts {
            let fast = d.params.as_ref().unwrap()["fast"].as_i64().unwrap();
            assert!(fast == 8 || fast == 12);
        }
    }

    #[test]
    fn single_parent_family_is_not_eligible() {
        let mut single = parents();
        single.truncate(1);
        let rng = ChaCha8Rng::seed_from_u64(1);
        let mut source = EvolutionaryRecombination::new(single, vec!["BTC".to_string()], Direction::Bidi, 0.0, 3, rng);
        let mut budget = RemainingBudget { daily_remaining: 10 };
        assert!(source.generate(&mut budget).unwrap().is_empty());
    }
}

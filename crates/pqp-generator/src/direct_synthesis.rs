//! Direct synthesis (§4.2): an injected `LlmClient` suggests a template and
//! a tuned parameter set. No prompt-engineering logic lives here — the
//! client is a fixed external contract (§1 Non-goals) this source just
//! drives once per call.

use anyhow::Result;
use pqp_schemas::Direction;

use crate::source::{CandidateDraft, CandidateSource, RemainingBudget};

/// One suggestion from the injected language model.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmSuggestion {
    pub template_name: String,
    pub params: Option<serde_json::Value>,
}

/// External synthesis contract. Implementations own their own API client,
/// prompt construction, and retry policy — all out of scope here.
pub trait LlmClient: Send + Sync {
    fn suggest(&mut self, symbols: &[String], direction: Direction) -> Result<LlmSuggestion>;
}

pub struct DirectSynthesis<C: LlmClient> {
    client: C,
    symbols: Vec<String>,
    direction: Direction,
}

impl<C: LlmClient> DirectSynthesis<C> {
    pub fn new(client: C, symbols: Vec<String>, direction: Direction) -> Self {
        Self { client, symbols, direction }
    }
}

impl<C: LlmClient> CandidateSource for DirectSynthesis<C> {
    fn name(&self) -> &'static str {
        "direct_synthesis"
    }

    fn generate(&mut self, budget: &mut RemainingBudget) -> Result<Vec<CandidateDraft>> {
        if budget.take(1) == 0 {
            return Ok(Vec::new());
        }

        let suggestion = self.client.suggest(&self.symbols, self.direction)?;
        Ok(vec![CandidateDraft {
            template_name: suggestion.template_name,
            params: suggestion.params,
            symbols: self.symbols.clone(),
            direction: self.direction,
            source_label: self.name(),
            template_id: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClient {
        calls: usize,
    }

    impl LlmClient for FixedClient {
        fn suggest(&mut self, _symbols: &[String], _direction: Direction) -> Result<LlmSuggestion> {
            self.calls += 1;
            Ok(LlmSuggestion {
                template_name: "ma_cross".to_string(),
                params: Some(serde_json::json!({"fast": 8, "slow": 21})),
            })
        }
    }

    #[test]
    fn generate_consumes_exactly_one_unit_of_budget() {
        let mut source = DirectSynthesis::new(FixedClient { calls: 0 }, vec!["BTC".to_string()], Direction::Long);
        let mut budget = RemainingBudget { daily_remaining: 5 };
        let drafts = source.generate(&mut budget).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(budget.daily_remaining, 4);
        assert_eq!(drafts[0].template_name, "ma_cross");
        assert_eq!(drafts[0].source_label, "direct_synthesis");
    }

    #[test]
    fn exhausted_budget_yields_nothing() {
        let mut source = DirectSynthesis::new(FixedClient { calls: 0 }, vec!["BTC".to_string()], Direction::Long);
        let mut budget = RemainingBudget { daily_remaining: 0 };
        assert!(source.generate(&mut budget).unwrap().is_empty());
    }
}

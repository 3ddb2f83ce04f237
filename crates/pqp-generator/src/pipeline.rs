//! Top-level orchestrator (§4.2): round-robins the registered
//! `CandidateSource`s, resolves a draft against the coin universe and
//! direction rotation, checks the per-template variant cap, and persists
//! a fresh `Generated` row. `pqp-cli generate` drives this crate's tick
//! function inside a `pqp_runtime::ClaimLoop`; the loop's "claim" is this
//! module producing the next candidate rather than claiming a DB row.

use anyhow::Result;
use chrono::Utc;
use pqp_audit::EventTracker;
use pqp_coinreg::{CoinRegistry, DirectionRotation, RegimeEstimator};
use pqp_schemas::{Strategy, StrategyStatus};
use pqp_strategy::StrategyRegistry;
use sqlx::PgPool;
use uuid::Uuid;

use crate::hashing::base_code_hash;
use crate::source::{CandidateDraft, CandidateSource, RemainingBudget};

/// Caps how many live/pending variants of one underlying template may
/// exist before the Generator stops proposing more of it.
pub struct GeneratorConfig {
    pub max_variants_per_base_hash: i64,
    pub symbols_per_candidate: usize,
}

/// Drives candidate production. Owns the coin cache and direction rotation;
/// the registered sources and strategy registry are borrowed per tick since
/// they outlive any one generator run.
pub struct Generator {
    sources: Vec<Box<dyn CandidateSource>>,
    next_source: usize,
    pending: Vec<CandidateDraft>,
    pub coins: CoinRegistry,
    pub rotation: DirectionRotation,
}

impl Generator {
    pub fn new(sources: Vec<Box<dyn CandidateSource>>) -> Self {
        Self {
            sources,
            next_source: 0,
            pending: Vec::new(),
            coins: CoinRegistry::new(),
            rotation: DirectionRotation::new(),
        }
    }

    /// Pulls the next candidate draft, round-robining across sources until
    /// one produces something or every source has been tried once this call.
    fn next_draft(&mut self, budget: &mut RemainingBudget) -> Result<Option<CandidateDraft>> {
        if let Some(draft) = self.pending.pop() {
            return Ok(Some(draft));
        }
        if self.sources.is_empty() || budget.is_exhausted() {
            return Ok(None);
        }

        for _ in 0..self.sources.len() {
            let idx = self.next_source;
            self.next_source = (self.next_source + 1) % self.sources.len();
            let mut produced = self.sources[idx].generate(budget)?;
            if produced.is_empty() {
                continue;
            }
            let draft = produced.pop();
            self.pending.extend(produced);
            return Ok(draft);
        }
        Ok(None)
    }
}

/// Outcome of one generation tick.
pub enum TickOutcome {
    /// A fresh strategy row was inserted with this id.
    Inserted(Uuid),
    /// A draft was produced but skipped because its template already has
    /// `max_variants_per_base_hash` live/pending variants.
    SkippedAtCap { base_code_hash: String },
    /// No source had anything to offer this call (budget exhausted or every
    /// source is momentarily dry).
    Nothing,
}

/// Runs one unit of generation: pulls a draft, resolves symbols and
/// category against `registry`/`coins`, checks the variant cap, and
/// inserts the row on success. This is the closure body `pqp-cli generate`
/// hands to `pqp_runtime::ClaimLoop::run` as its `claim`.
pub async fn tick(
    pool: &PgPool,
    registry: &StrategyRegistry,
    generator: &mut Generator,
    regime: &dyn RegimeEstimator,
    tracker: &EventTracker,
    config: &GeneratorConfig,
    budget: &mut RemainingBudget,
) -> Result<TickOutcome> {
    let Some(mut draft) = generator.next_draft(budget)? else {
        return Ok(TickOutcome::Nothing);
    };

    if draft.symbols.is_empty() {
        draft.symbols = generator.coins.top_n_by_volume(config.symbols_per_candidate, regime);
    }
    if draft.symbols.is_empty() {
        return Ok(TickOutcome::Nothing);
    }

    let meta = registry.lookup(&draft.template_name)?;
    let hash = base_code_hash(&draft.template_name, draft.params.as_ref());

    let existing = pqp_db::strategies::count_by_base_code_hash(pool, &hash).await?;
    if existing >= config.max_variants_per_base_hash {
        tracker.emit_stage_event(
            None,
            &draft.template_name,
            Some(hash.clone()),
            "generate",
            "skipped",
            "candidate_rejected",
            None,
            serde_json::json!({ "reason": "base_code_hash_at_cap", "source": draft.source_label }),
        );
        return Ok(TickOutcome::SkippedAtCap { base_code_hash: hash });
    }

    let now = Utc::now();
    let mut params = draft.params.unwrap_or(serde_json::Value::Null);
    if let serde_json::Value::Object(ref mut map) = params {
        map.insert("direction".to_string(), serde_json::json!(draft.direction));
    }

    // `name` is the registered template this row instantiates, not a
    // per-instance label — `id` already uniquely identifies the instance,
    // and the Validator needs `name` to look the template back up in
    // `pqp_strategy::StrategyRegistry`.
    let template_id = draft
        .template_id
        .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, draft.template_name.as_bytes()));

    let strategy = Strategy {
        id: Uuid::new_v4(),
        name: draft.template_name.clone(),
        category: meta.category.clone(),
        bar_interval: pqp_schemas::BarInterval::M15,
        source: draft.source_label.to_string(),
        template_id: Some(template_id),
        params: Some(params),
        base_code_hash: Some(hash.clone()),
        status: StrategyStatus::Generated,
        processing_by: None,
        processing_started_at: None,
        generated_at: now,
        validated_at: None,
        tested_at: None,
        selected_at: None,
        live_at: None,
        retired_at: None,
        symbols: draft.symbols,
        optimal_bar_interval: None,
    };

    pqp_db::strategies::insert_strategy(pool, &strategy).await?;

    tracker.emit_stage_event(
        Some(strategy.id),
        &strategy.name,
        Some(hash),
        "generate",
        "generated",
        "created",
        None,
        serde_json::json!({ "source": draft.source_label }),
    );

    Ok(TickOutcome::Inserted(strategy.id))
}

/// Queue depth the caller's `pqp_runtime::cooldown` backpressure check is
/// computed against: how many candidates are waiting to be validated.
pub async fn generated_queue_depth(pool: &PgPool) -> Result<i64> {
    pqp_db::strategies::count_by_status(pool, StrategyStatus::Generated).await
}

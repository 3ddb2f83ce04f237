//! `StabilityProbe` (§4.3 phase 5, optional): coefficient-of-variation of
//! the candidate's signal rate across several synthetic-fixture window
//! lengths. A template whose behaviour swings wildly as the window grows
//! or shrinks is brittle to the exact amount of history it happens to see
//! at deploy time. Cached alongside the shuffle test's row, keyed the same
//! way, so a later shuffle-cache hit also carries a stability figure.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use pqp_schemas::ValidationCache;
use pqp_strategy::PrefixView;

use crate::fixture::synthetic_bars;
use crate::phase::{PhaseContext, PhaseOutcome, ValidationPhase};

const WINDOW_LENS: [usize; 4] = [100, 150, 200, 250];
const MAX_COEFFICIENT_OF_VARIATION: f64 = 0.6;

fn signal_rate(strategy: &dyn pqp_strategy::Strategy, len: usize) -> f64 {
    let bars = synthetic_bars(len);
    let indicators = strategy.precompute_indicators(&bars);
    let mut count = 0u32;
    for i in 0..bars.len() {
        let view = PrefixView::new(&bars, &indicators, i);
        if strategy.generate_signal(view, None).is_some() {
            count += 1;
        }
    }
    count as f64 / len as f64
}

fn coefficient_of_variation(samples: &[f64]) -> Option<f64> {
    let n = samples.len() as f64;
    if n == 0.0 {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

pub struct StabilityProbe;

#[async_trait]
impl ValidationPhase for StabilityProbe {
    fn name(&self) -> &'static str {
        "stability_probe"
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutcome> {
        let Some(hash) = ctx.strategy.base_code_hash.clone() else {
            return Ok(PhaseOutcome::fail("candidate has no base_code_hash to key the stability cache on"));
        };

        let strategy = match ctx.registry.instantiate(&ctx.strategy.name, ctx.strategy.params.as_ref()) {
            Ok(s) => s,
            Err(err) => return Ok(PhaseOutcome::fail(err.to_string())),
        };

        let samples: Vec<f64> = WINDOW_LENS.iter().map(|&len| signal_rate(strategy.as_ref(), len)).collect();
        let cv = coefficient_of_variation(&samples);

        let passed = match cv {
            Some(cv) => cv <= MAX_COEFFICIENT_OF_VARIATION,
            None => false,
        };

        let existing = pqp_db::validation_cache::lookup(ctx.pool, &hash).await?;
        pqp_db::validation_cache::upsert(
            ctx.pool,
            &ValidationCache {
                code_hash: hash,
                passed: existing.map(|e| e.passed).unwrap_or(passed),
                checked_at: Utc::now(),
                stability_coefficient_of_variation: cv,
            },
        )
        .await?;

        let detail = serde_json::json!({ "coefficient_of_variation": cv });
        Ok(if passed {
            PhaseOutcome::pass_with(detail)
        } else {
            PhaseOutcome::fail("signal rate is unstable across fixture window lengths")
        })
    }
}

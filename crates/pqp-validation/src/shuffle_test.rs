//! `ShuffleTest` (§4.3 phase 4, Invariant 5): consults
//! `pqp_db::validation_cache` by `base_code_hash` first — a cache hit
//! short-circuits with `cached=true` and no re-execution. On a miss, runs
//! a seeded reshuffle of the synthetic fixture and compares the reshuffled
//! trade count against the original: a strategy that trades just as much
//! on scrambled noise as on the real path is pattern-matching noise, not
//! structure, and fails here. Either way the result is upserted back into
//! the cache so every strategy sharing the hash inherits it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use pqp_schemas::ValidationCache;
use pqp_strategy::PrefixView;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::fixture::{shuffled_closes, synthetic_bars};
use crate::phase::{PhaseContext, PhaseOutcome, ValidationPhase};

const FIXTURE_LEN: usize = 200;
const RESHUFFLE_SEED: u64 = 0x5375_6666; // "Shuff" in hex, fixed so runs are reproducible.
/// A reshuffled series trading at least this fraction as often as the
/// original is taken as "trading the noise", not the pattern.
const MAX_NOISE_TRADE_RATIO: f64 = 0.8;

pub struct ShuffleTest;

fn count_signals(strategy: &dyn pqp_strategy::Strategy, bars: &[pqp_strategy::Bar]) -> u32 {
    let indicators = strategy.precompute_indicators(bars);
    let mut count = 0u32;
    for i in 0..bars.len() {
        let view = PrefixView::new(bars, &indicators, i);
        if strategy.generate_signal(view, None).is_some() {
            count += 1;
        }
    }
    count
}

#[async_trait]
impl ValidationPhase for ShuffleTest {
    fn name(&self) -> &'static str {
        "shuffle_test"
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutcome> {
        let Some(hash) = ctx.strategy.base_code_hash.clone() else {
            return Ok(PhaseOutcome::fail("candidate has no base_code_hash to key the shuffle cache on"));
        };

        if let Some(cached) = pqp_db::validation_cache::lookup(ctx.pool, &hash).await? {
            let detail = serde_json::json!({ "cached": true });
            return Ok(if cached.passed {
                PhaseOutcome::pass_with(detail)
            } else {
                PhaseOutcome::fail("cached shuffle test result was a failure")
            });
        }

        let strategy = match ctx.registry.instantiate(&ctx.strategy.name, ctx.strategy.params.as_ref()) {
            Ok(s) => s,
            Err(err) => return Ok(PhaseOutcome::fail(err.to_string())),
        };

        let original = synthetic_bars(FIXTURE_LEN);
        let original_signals = count_signals(strategy.as_ref(), &original);

        let mut rng = ChaCha8Rng::seed_from_u64(RESHUFFLE_SEED);
        let shuffled = shuffled_closes(&original, &mut rng);
        let shuffled_signals = count_signals(strategy.as_ref(), &shuffled);

        let passed = if original_signals == 0 {
            false
        } else {
            (shuffled_signals as f64 / original_signals as f64) < MAX_NOISE_TRADE_RATIO
        };

        pqp_db::validation_cache::upsert(
            ctx.pool,
            &ValidationCache {
                code_hash: hash,
                passed,
                checked_at: Utc::now(),
                stability_coefficient_of_variation: None,
            },
        )
        .await?;

        let detail = serde_json::json!({
            "cached": false,
            "original_signals": original_signals,
            "shuffled_signals": shuffled_signals,
        });

        Ok(if passed {
            PhaseOutcome::pass_with(detail)
        } else {
            PhaseOutcome::fail("strategy trades the shuffled series nearly as much as the real one")
        })
    }
}

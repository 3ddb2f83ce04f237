//! The `ValidationPhase` contract (§4.3): five phases run in sequence,
//! each able to fail fast. Grounded on `mqk-risk::engine::evaluate`'s
//! early-return-on-violation style and `mqk-integrity::engine`'s
//! decision-struct shape, generalised from one monolithic evaluator
//! function into an ordered list of small, independently testable phases.

use anyhow::Result;
use async_trait::async_trait;
use pqp_schemas::Strategy;
use pqp_strategy::StrategyRegistry;
use sqlx::PgPool;

/// What one phase needs to do its work. Borrowed, never owned: phases run
/// one after another against the same claimed row.
pub struct PhaseContext<'a> {
    pub pool: &'a PgPool,
    pub registry: &'a StrategyRegistry,
    pub strategy: &'a Strategy,
}

/// A phase's verdict. `Fail` carries the reason stamped onto the
/// `{phase}_failed` event; `Pass` may carry extra detail (e.g. the shuffle
/// test's cache-hit flag) folded into the `validation_completed` event.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Pass { detail: serde_json::Value },
    Fail { reason: String },
}

impl PhaseOutcome {
    pub fn pass() -> Self {
        Self::Pass { detail: serde_json::Value::Null }
    }

    pub fn pass_with(detail: serde_json::Value) -> Self {
        Self::Pass { detail }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail { reason: reason.into() }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

#[async_trait]
pub trait ValidationPhase: Send + Sync {
    /// Stable name, stamped as `{name}_failed` on rejection.
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutcome>;
}

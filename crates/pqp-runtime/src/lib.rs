//! pqp-runtime
//!
//! Shared role-process scaffolding: the backpressure cooldown formula and
//! the generic claim-loop driver every worker role (`pqp-generator`,
//! `pqp-validation`, `pqp-backtest`) is built on top of.

mod claim_loop;
mod cooldown;

pub use claim_loop::{BackpressureConfig, ClaimLoop};
pub use cooldown::cooldown;

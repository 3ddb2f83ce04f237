//! pqp-strategy
//!
//! The Strategy contract (§6): category/bar-interval/direction, a one-time
//! `precompute_indicators` pass, and a prefix-bounded `generate_signal` step
//! that can only read `iloc[-1]`/`iloc[-N:]`-style views. Strategies are
//! compiled into the binary and looked up through a [`StrategyRegistry`]
//! built explicitly by the owning process — no global registry, no runtime
//! source loading.

pub mod builtins;
mod registry;
mod template;
mod types;

pub use registry::{RegistryError, StrategyFactory, StrategyMeta, StrategyRegistry};
pub use template::{param_hash, ParamAxis, ParamGrid};
pub use types::*;

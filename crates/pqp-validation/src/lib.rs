//! pqp-validation
//!
//! The Validator role (§4.3): five ordered phases
//! (`StaticChecks` → `DynamicInstantiate` → `SyntheticSmokeTest` →
//! `ShuffleTest` → `StabilityProbe`) run against one claimed `Generated`
//! row, stopping at the first failure. This crate owns no claim logic
//! itself; `pqp-cli validate` drives [`validate_one`] inside a
//! `pqp_runtime::ClaimLoop`.

mod dynamic_instantiate;
mod fixture;
mod phase;
mod pipeline;
mod shuffle_test;
mod static_checks;
mod stability_probe;
mod synthetic_smoke_test;

pub use dynamic_instantiate::DynamicInstantiate;
pub use phase::{PhaseContext, PhaseOutcome, ValidationPhase};
pub use pipeline::{default_phases, validate_one, validated_queue_depth, ValidationOutcome};
pub use shuffle_test::ShuffleTest;
pub use static_checks::StaticChecks;
pub use stability_probe::StabilityProbe;
pub use synthetic_smoke_test::SyntheticSmokeTest;

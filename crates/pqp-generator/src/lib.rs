//! pqp-generator
//!
//! The Generator role (§4.2): four `CandidateSource` implementations
//! (`DirectSynthesis`, `ParametricExpansion`, `EvolutionaryRecombination`,
//! `PatternComposition`) round-robined by [`Generator`], each candidate
//! resolved against the tradable-coin universe and direction rotation,
//! deduplicated by `base_code_hash`, and persisted as a `Generated` row.
//! `pqp-cli generate` drives [`pipeline::tick`] inside a
//! `pqp_runtime::ClaimLoop`.

mod direct_synthesis;
mod evolutionary_recombination;
mod hashing;
mod parametric_expansion;
mod pattern_composition;
mod pipeline;
mod source;

pub use direct_synthesis::{DirectSynthesis, LlmClient, LlmSuggestion};
pub use evolutionary_recombination::{EvolutionaryRecombination, Parent};
pub use hashing::base_code_hash;
pub use parametric_expansion::ParametricExpansion;
pub use pattern_composition::{PatternCategory, PatternComposition, UngerPattern};
pub use pipeline::{generated_queue_depth, tick, Generator, GeneratorConfig, TickOutcome};
pub use source::{CandidateDraft, CandidateSource, RemainingBudget};

//! pqp-promotion
//!
//! The Classifier role (§4.5): the only role permitted to flip a strategy
//! between `Tested`/`Selected` or retire it on live performance. Runs on a
//! fixed cadence rather than a claim loop — it scans the whole survivor set
//! each tick instead of contending over single rows.

mod archive;
mod config;
mod live_metrics;
mod pipeline;
mod rank_and_promote;
mod retirement;

pub use archive::archive_losers;
pub use config::ClassifierConfig;
pub use live_metrics::compute_live_result;
pub use pipeline::{run_cadence, run_once};
pub use rank_and_promote::rank_and_promote;
pub use retirement::{check_retirements, RetirementReason};

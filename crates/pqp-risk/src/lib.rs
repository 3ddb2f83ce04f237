//! pqp-risk
//!
//! The EmergencyStopManager (§4.8): scoped (global/subaccount/strategy) kill
//! switches that gate every order the Executor would otherwise place. Runs
//! on a fixed cadence like the Classifier, generalising `mqk-risk::engine`'s
//! pure per-account guard functions to scoped DB-backed aggregates.

mod config;
mod evaluate;
mod gate;
mod pipeline;
mod reset;
mod stop;

pub use config::EmergencyStopConfig;
pub use evaluate::evaluate_conditions;
pub use gate::{can_trade, gate};
pub use pipeline::{run_cadence, run_once};
pub use reset::auto_reset;
pub use stop::{
    check_consecutive_losses, check_daily_loss, check_drawdown, check_global_exposure,
    TriggeredStop,
};

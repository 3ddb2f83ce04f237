//! pqp-schemas
//!
//! Domain model shared by every pipeline role: the `Strategy` state machine,
//! the validation/backtest/trade/subaccount/emergency-stop records, and the
//! append-only event envelope. No IO lives here — `pqp-db` owns persistence,
//! this crate owns shape.

mod broker;
mod event;
mod stop;
mod strategy;
mod subaccount;
mod tasks;
mod trade;
mod validation;

pub use broker::{BrokerAccount, BrokerFill, BrokerOrder, BrokerPosition, BrokerSnapshot};
pub use event::StrategyEvent;
pub use stop::{EmergencyStopState, Scope, StopAction};
pub use strategy::{BarInterval, Direction, Strategy, StrategyStatus};
pub use subaccount::{Subaccount, SubaccountStatus};
pub use tasks::{PairsUpdateLog, ScheduledTaskExecution, TaskStatus};
pub use trade::{ExitReason, Trade, TradeDirection};
pub use validation::{BacktestResult, PeriodType, ScoreWeights, ValidationCache};

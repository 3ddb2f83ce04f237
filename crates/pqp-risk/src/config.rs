//! Tunables for the EmergencyStopManager (§4.8). No `Default` on purpose,
//! same rationale as `pqp-promotion::ClassifierConfig`: these thresholds are
//! a deployment decision, not a safe fallback.

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct EmergencyStopConfig {
    /// Minimum spacing between evaluation cycles (throttles `evaluate_conditions`).
    pub evaluate_interval: chrono::Duration,
    /// Fractional drawdown from peak that closes a subaccount's positions.
    pub drawdown_limit: Decimal,
    /// Absolute daily loss (positive number) that pauses a subaccount.
    pub daily_loss_limit: Decimal,
    /// Consecutive closed losing trades that pause a subaccount.
    pub consecutive_losses_limit: u32,
    /// Total allocated capital across every `Live` subaccount that pauses
    /// all trading globally.
    pub global_exposure_limit: Decimal,
    /// How long a triggered stop blocks trading once tripped.
    pub cooldown: chrono::Duration,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit at which an emergency stop applies (§3 "EmergencyStopState",
/// GLOSSARY "scope").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Scope {
    Global,
    Subaccount,
    Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum StopAction {
    Pause,
    ClosePositions,
}

/// Keyed by `(scope, scope_id)`; `scope_id` is `None` only for `Scope::Global`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmergencyStopState {
    pub scope: Scope,
    pub scope_id: Option<Uuid>,
    pub is_stopped: bool,
    pub reason: String,
    pub action: StopAction,
    pub stop_time: DateTime<Utc>,
    pub cooldown_until: DateTime<Utc>,
    pub reset_trigger: Option<String>,
}

impl EmergencyStopState {
    /// `true` if this row currently blocks trading: stopped and cool-down not
    /// yet elapsed (§4.8 `can_trade`).
    pub fn blocks(&self, now: DateTime<Utc>) -> bool {
        self.is_stopped && now < self.cooldown_until
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An append-only pipeline event (§3 "StrategyEvent", Invariant 6). Never
/// updated or deleted; `strategy_name`/`base_code_hash` are denormalised so
/// metrics remain computable after the referenced `Strategy` row is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StrategyEvent {
    pub event_id: Uuid,
    pub ts: DateTime<Utc>,
    pub strategy_id: Option<Uuid>,
    pub strategy_name: String,
    pub base_code_hash: Option<String>,
    pub event_type: String,
    pub stage: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub detail: serde_json::Value,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

/// Per-run record for a periodic job (symbol universe refresh, regime
/// refresh, data coverage refresh) — §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledTaskExecution {
    pub id: Uuid,
    pub task_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub rows_affected: Option<i64>,
    pub error: Option<String>,
}

/// Per-run record for the coin/symbol universe refresh job specifically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PairsUpdateLog {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub symbols_added: i32,
    pub symbols_removed: i32,
    pub symbols_total: i32,
    pub error: Option<String>,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ExitReason {
    SignalClose,
    StopLoss,
    TakeProfit,
    TimeExit,
    EmergencyStop,
    Reconciliation,
}

/// An open or closed live position (§3 "Trade"). Owned exclusively by the
/// Executor (§4.7 "State ownership").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trade {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub subaccount_id: Uuid,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub entry_size: Decimal,
    pub stop_loss_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    pub realized_pnl: Option<Decimal>,
    pub realized_pnl_ratio: Option<Decimal>,
    pub leverage: Decimal,
    pub entry_fee: Decimal,
    pub exit_fee: Option<Decimal>,
    pub duration_secs: Option<i64>,
    pub venue_dedup_id: Option<String>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

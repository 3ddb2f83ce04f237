use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum SubaccountStatus {
    Active,
    Paused,
    Stopped,
    Retired,
}

/// A capital bucket bound to at most one `LIVE` strategy at a time (§3
/// "Subaccount", Invariant 3/4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subaccount {
    pub id: Uuid,
    pub status: SubaccountStatus,
    pub strategy_id: Option<Uuid>,
    pub allocated_capital: Decimal,
    pub current_balance: Decimal,
    pub peak_balance: Decimal,
    pub peak_balance_updated_at: Option<DateTime<Utc>>,
    pub daily_pnl: Decimal,
    pub daily_pnl_reset_date: Option<NaiveDate>,
}

impl Subaccount {
    /// Invariant 4: `peak_balance >= current_balance` at rest; advances peak
    /// when balance exceeds it. Idempotent — safe to call every tick.
    pub fn advance_peak(&mut self, now: DateTime<Utc>) {
        if self.current_balance > self.peak_balance {
            self.peak_balance = self.current_balance;
            self.peak_balance_updated_at = Some(now);
        }
    }

    /// Fractional drawdown from peak, `0.0` when at or above peak.
    pub fn drawdown_fraction(&self) -> Decimal {
        if self.peak_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let dd = self.peak_balance - self.current_balance;
        if dd <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            dd / self.peak_balance
        }
    }

    /// Resets `daily_pnl` when `today` has rolled past `daily_pnl_reset_date`.
    pub fn roll_daily_pnl(&mut self, today: NaiveDate) {
        if self.daily_pnl_reset_date != Some(today) {
            self.daily_pnl = Decimal::ZERO;
            self.daily_pnl_reset_date = Some(today);
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == SubaccountStatus::Active && self.strategy_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sa(peak: i64, cur: i64) -> Subaccount {
        Subaccount {
            id: Uuid::nil(),
            status: SubaccountStatus::Active,
            strategy_id: None,
            allocated_capital: Decimal::from(100),
            current_balance: Decimal::from(cur),
            peak_balance: Decimal::from(peak),
            peak_balance_updated_at: None,
            daily_pnl: Decimal::ZERO,
            daily_pnl_reset_date: None,
        }
    }

    #[test]
    fn peak_advances_only_upward() {
        let mut s = sa(100, 140);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        s.advance_peak(now);
        assert_eq!(s.peak_balance, Decimal::from(140));

        s.current_balance = Decimal::from(120);
        s.advance_peak(now);
        assert_eq!(s.peak_balance, Decimal::from(140), "peak must not regress");
    }

    #[test]
    fn drawdown_fraction_matches_scenario_5() {
        // §8 scenario 5: peak 200 -> current 140 is a 30% drawdown.
        let s = sa(200, 140);
        let dd = s.drawdown_fraction();
        assert!((dd.to_string().parse::<f64>().unwrap() - 0.30).abs() < 1e-9);
    }
}

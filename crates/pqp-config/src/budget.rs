//! Daily synthesis budget counter (§4.2, §5).
//!
//! The Generator's LLM-calling sub-source is bounded by a daily cap that
//! resets at local midnight. The counter must survive process restarts, so
//! it is persisted to a small JSON file on disk and guarded by a process-
//! local mutex (§5 "Rate limits" — "process-persisted, lock-protected
//! integer with daily reset").

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BudgetFile {
    date: NaiveDate,
    used: u32,
}

/// A daily-resetting counter backed by a file, safe for single-process
/// concurrent use via an internal mutex.
pub struct SynthesisBudget {
    path: PathBuf,
    daily_limit: u32,
    state: Mutex<BudgetFile>,
}

impl SynthesisBudget {
    /// Loads (or initialises) the counter from `path`. Rolls over to a fresh
    /// `used = 0` if the persisted date is not today's local date.
    pub fn load(path: impl AsRef<Path>, daily_limit: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let today = Local::now().date_naive();

        let state = match fs::read_to_string(&path) {
            Ok(s) => {
                let parsed: BudgetFile =
                    serde_json::from_str(&s).with_context(|| format!("parse {path:?}"))?;
                if parsed.date == today {
                    parsed
                } else {
                    BudgetFile { date: today, used: 0 }
                }
            }
            Err(_) => BudgetFile { date: today, used: 0 },
        };

        let budget = Self {
            path,
            daily_limit,
            state: Mutex::new(state),
        };
        budget.persist()?;
        Ok(budget)
    }

    fn persist(&self) -> Result<()> {
        let state = self.state.lock().expect("budget mutex poisoned");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let s = serde_json::to_string(&*state)?;
        fs::write(&self.path, s).with_context(|| format!("write {:?}", self.path))?;
        Ok(())
    }

    /// Rolls to a fresh day if local midnight has passed since the counter
    /// was last touched.
    fn roll_if_new_day(&self) {
        let mut state = self.state.lock().expect("budget mutex poisoned");
        let today = Local::now().date_naive();
        if state.date != today {
            state.date = today;
            state.used = 0;
        }
    }

    /// Attempts to consume one unit of budget. Returns `true` (and persists)
    /// if capacity remained; `false` if the daily cap is already reached —
    /// the caller must sleep until next local midnight (§7).
    pub fn try_consume(&self) -> Result<bool> {
        self.roll_if_new_day();
        let allowed = {
            let mut state = self.state.lock().expect("budget mutex poisoned");
            if state.used >= self.daily_limit {
                false
            } else {
                state.used += 1;
                true
            }
        };
        if allowed {
            self.persist()?;
        }
        Ok(allowed)
    }

    pub fn remaining(&self) -> u32 {
        self.roll_if_new_day();
        let state = self.state.lock().expect("budget mutex poisoned");
        self.daily_limit.saturating_sub(state.used)
    }

    /// Duration until local midnight, for the Generator to sleep on exhaustion.
    pub fn time_until_reset(&self) -> chrono::Duration {
        let now = Local::now();
        let tomorrow = (now.date_naive() + chrono::Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time");
        let tomorrow_local = tomorrow.and_local_timezone(Local).single().unwrap_or(now);
        tomorrow_local.signed_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_until_exhausted_then_blocks() {
        let dir = std::env::temp_dir().join(format!("pqp-budget-test-{}", uuid_like()));
        let path = dir.join("budget.json");
        let b = SynthesisBudget::load(&path, 2).unwrap();
        assert!(b.try_consume().unwrap());
        assert!(b.try_consume().unwrap());
        assert!(!b.try_consume().unwrap());
        assert_eq!(b.remaining(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    fn uuid_like() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    }
}

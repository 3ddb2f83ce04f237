//! `can_trade` (§4.8): the read path every would-be order passes through.
//! Split into a pure three-row gate plus a DB-fetching wrapper, the same
//! split `pqp-promotion::retirement` uses between its predicate and its
//! pipeline driver.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pqp_schemas::{EmergencyStopState, Scope};
use sqlx::PgPool;
use uuid::Uuid;

/// `true` unless any of the three scoped rows is currently stopped and its
/// cooldown has not yet elapsed.
pub fn gate(
    global: Option<&EmergencyStopState>,
    subaccount: Option<&EmergencyStopState>,
    strategy: Option<&EmergencyStopState>,
    now: DateTime<Utc>,
) -> bool {
    ![global, subaccount, strategy]
        .into_iter()
        .flatten()
        .any(|state| state.blocks(now))
}

/// Fetches the three scope rows for `(subaccount_id, strategy_id)` and
/// applies [`gate`]. Either id may legitimately have no row yet, in which
/// case that scope never blocks.
pub async fn can_trade(pool: &PgPool, subaccount_id: Uuid, strategy_id: Uuid) -> Result<bool> {
    let now = Utc::now();
    let global = pqp_db::emergency_stop::fetch(pool, Scope::Global, None).await?;
    let subaccount = pqp_db::emergency_stop::fetch(pool, Scope::Subaccount, Some(subaccount_id)).await?;
    let strategy = pqp_db::emergency_stop::fetch(pool, Scope::Strategy, Some(strategy_id)).await?;

    Ok(gate(global.as_ref(), subaccount.as_ref(), strategy.as_ref(), now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqp_schemas::StopAction;

    fn state(is_stopped: bool, cooldown_until: DateTime<Utc>) -> EmergencyStopState {
        EmergencyStopState {
            scope: Scope::Subaccount,
            scope_id: Some(Uuid::new_v4()),
            is_stopped,
            reason: "test".to_string(),
            action: StopAction::Pause,
            stop_time: Utc::now(),
            cooldown_until,
            reset_trigger: None,
        }
    }

    #[test]
    fn no_rows_allows_trading() {
        assert!(gate(None, None, None, Utc::now()));
    }

    #[test]
    fn an_active_cooldown_blocks() {
        let now = Utc::now();
        let blocked = state(true, now + chrono::Duration::minutes(5));
        assert!(!gate(None, Some(&blocked), None, now));
    }

    #[test]
    fn an_elapsed_cooldown_does_not_block() {
        let now = Utc::now();
        let expired = state(true, now - chrono::Duration::minutes(5));
        assert!(gate(None, Some(&expired), None, now));
    }

    #[test]
    fn a_cleared_row_does_not_block_even_within_the_cooldown_window() {
        let now = Utc::now();
        let cleared = state(false, now + chrono::Duration::minutes(5));
        assert!(gate(None, Some(&cleared), None, now));
    }

    #[test]
    fn a_global_stop_blocks_regardless_of_the_other_two_scopes() {
        let now = Utc::now();
        let global = state(true, now + chrono::Duration::minutes(5));
        assert!(!gate(Some(&global), None, None, now));
    }
}

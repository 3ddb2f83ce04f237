//! `auto_reset` (§4.8): clears every stop whose cooldown elapsed and which
//! carries no `reset_trigger`, and logs the rest as pending manual review.

use anyhow::Result;
use sqlx::PgPool;

pub async fn auto_reset(pool: &PgPool) -> Result<u64> {
    let cleared = pqp_db::emergency_stop::auto_reset_expired(pool).await?;

    let stuck = pqp_db::emergency_stop::list_cooldown_elapsed(pool).await?;
    for row in &stuck {
        tracing::warn!(
            scope = ?row.scope,
            scope_id = ?row.scope_id,
            reason = %row.reason,
            reset_trigger = ?row.reset_trigger,
            "emergency stop past cooldown but pending manual review"
        );
    }

    Ok(cleared)
}

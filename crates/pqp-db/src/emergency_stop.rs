//! Emergency-stop state keyed by `(scope, scope_id)`. `scope_id` is `None`
//! only for `Scope::Global`; the two partial unique indexes in the migration
//! enforce a single row per scope without a nullable-in-primary-key hack.

use anyhow::Context;
use anyhow::Result;
use pqp_schemas::{EmergencyStopState, Scope};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_state(row: sqlx::postgres::PgRow) -> Result<EmergencyStopState> {
    Ok(EmergencyStopState {
        scope: row.try_get("scope")?,
        scope_id: row.try_get("scope_id")?,
        is_stopped: row.try_get("is_stopped")?,
        reason: row.try_get("reason")?,
        action: row.try_get("action")?,
        stop_time: row.try_get("stop_time")?,
        cooldown_until: row.try_get("cooldown_until")?,
        reset_trigger: row.try_get("reset_trigger")?,
    })
}

/// Trip (or refresh) the stop for `(scope, scope_id)`. Upserts on the scope
/// key — the same pair is always represented by exactly one row.
pub async fn trip(pool: &PgPool, state: &EmergencyStopState) -> Result<()> {
    sqlx::query(
        r#"
        insert into emergency_stop_state (
            scope, scope_id, is_stopped, reason, action, stop_time,
            cooldown_until, reset_trigger
        ) values ($1,$2,$3,$4,$5,$6,$7,$8)
        on conflict (scope, scope_id) where scope_id is not null do update
            set is_stopped = excluded.is_stopped,
                reason = excluded.reason,
                action = excluded.action,
                stop_time = excluded.stop_time,
                cooldown_until = excluded.cooldown_until,
                reset_trigger = excluded.reset_trigger
        "#,
    )
    .bind(state.scope)
    .bind(state.scope_id)
    .bind(state.is_stopped)
    .bind(&state.reason)
    .bind(state.action)
    .bind(state.stop_time)
    .bind(state.cooldown_until)
    .bind(&state.reset_trigger)
    .execute(pool)
    .await
    .context("emergency_stop trip (scoped) failed")?;
    Ok(())
}

/// Same as [`trip`] but for `Scope::Global`, whose `scope_id` is always NULL
/// and therefore needs the sibling partial unique index as its conflict target.
pub async fn trip_global(pool: &PgPool, state: &EmergencyStopState) -> Result<()> {
    sqlx::query(
        r#"
        insert into emergency_stop_state (
            scope, scope_id, is_stopped, reason, action, stop_time,
            cooldown_until, reset_trigger
        ) values ($1,null,$2,$3,$4,$5,$6,$7)
        on conflict (scope) where scope_id is null do update
            set is_stopped = excluded.is_stopped,
                reason = excluded.reason,
                action = excluded.action,
                stop_time = excluded.stop_time,
                cooldown_until = excluded.cooldown_until,
                reset_trigger = excluded.reset_trigger
        "#,
    )
    .bind(Scope::Global)
    .bind(state.is_stopped)
    .bind(&state.reason)
    .bind(state.action)
    .bind(state.stop_time)
    .bind(state.cooldown_until)
    .bind(&state.reset_trigger)
    .execute(pool)
    .await
    .context("emergency_stop trip_global failed")?;
    Ok(())
}

pub async fn fetch(
    pool: &PgPool,
    scope: Scope,
    scope_id: Option<Uuid>,
) -> Result<Option<EmergencyStopState>> {
    let row = match scope_id {
        Some(id) => {
            sqlx::query(
                r#"
                select scope, scope_id, is_stopped, reason, action, stop_time,
                       cooldown_until, reset_trigger
                from emergency_stop_state
                where scope = $1 and scope_id = $2
                "#,
            )
            .bind(scope)
            .bind(id)
            .fetch_optional(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                select scope, scope_id, is_stopped, reason, action, stop_time,
                       cooldown_until, reset_trigger
                from emergency_stop_state
                where scope = $1 and scope_id is null
                "#,
            )
            .bind(scope)
            .fetch_optional(pool)
            .await
        }
    }
    .context("emergency_stop fetch failed")?;

    match row {
        Some(r) => Ok(Some(row_to_state(r)?)),
        None => Ok(None),
    }
}

/// All currently-stopped rows whose cooldown has not yet elapsed, the set the
/// Executor must consult on every tick before placing an order.
pub async fn list_active(pool: &PgPool) -> Result<Vec<EmergencyStopState>> {
    let rows = sqlx::query(
        r#"
        select scope, scope_id, is_stopped, reason, action, stop_time,
               cooldown_until, reset_trigger
        from emergency_stop_state
        where is_stopped = true and cooldown_until > now()
        "#,
    )
    .fetch_all(pool)
    .await
    .context("emergency_stop list_active failed")?;

    rows.into_iter().map(row_to_state).collect()
}

/// Auto-reset: clear `is_stopped` for every row whose cooldown has elapsed
/// and which carries no `reset_trigger` (a set trigger means the stop was
/// severe enough to require a human look before it clears on its own).
/// Returns the number of rows cleared.
pub async fn auto_reset_expired(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        update emergency_stop_state
           set is_stopped = false
         where is_stopped = true and cooldown_until <= now() and reset_trigger is null
        "#,
    )
    .execute(pool)
    .await
    .context("emergency_stop auto_reset_expired failed")?;
    Ok(result.rows_affected())
}

/// Every stopped row whose cooldown has elapsed, regardless of whether it
/// auto-clears — used by the risk crate to log rows left stopped pending
/// manual review because `reset_trigger` is set.
pub async fn list_cooldown_elapsed(pool: &PgPool) -> Result<Vec<EmergencyStopState>> {
    let rows = sqlx::query(
        r#"
        select scope, scope_id, is_stopped, reason, action, stop_time,
               cooldown_until, reset_trigger
        from emergency_stop_state
        where is_stopped = true and cooldown_until <= now()
        "#,
    )
    .fetch_all(pool)
    .await
    .context("emergency_stop list_cooldown_elapsed failed")?;

    rows.into_iter().map(row_to_state).collect()
}

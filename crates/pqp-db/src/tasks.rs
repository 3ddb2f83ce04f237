//! Bookkeeping for periodic jobs: the generic `ScheduledTaskExecution` log
//! plus the coin/symbol universe refresh's dedicated `PairsUpdateLog`.

use anyhow::Context;
use anyhow::Result;
use chrono::{DateTime, Utc};
use pqp_schemas::{PairsUpdateLog, ScheduledTaskExecution, TaskStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub async fn start_task(pool: &PgPool, id: Uuid, task_name: &str) -> Result<()> {
    sqlx::query(
        r#"
        insert into scheduled_task_executions (id, task_name, started_at, status)
        values ($1, $2, now(), 'running')
        "#,
    )
    .bind(id)
    .bind(task_name)
    .execute(pool)
    .await
    .context("start_task failed")?;
    Ok(())
}

pub async fn finish_task(
    pool: &PgPool,
    id: Uuid,
    status: TaskStatus,
    rows_affected: Option<i64>,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        update scheduled_task_executions
           set finished_at = now(),
               status = $1,
               rows_affected = $2,
               error = $3
         where id = $4
        "#,
    )
    .bind(status)
    .bind(rows_affected)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await
    .context("finish_task failed")?;
    Ok(())
}

pub async fn latest_for_task(pool: &PgPool, task_name: &str) -> Result<Option<ScheduledTaskExecution>> {
    let row = sqlx::query(
        r#"
        select id, task_name, started_at, finished_at, status, rows_affected, error
        from scheduled_task_executions
        where task_name = $1
        order by started_at desc
        limit 1
        "#,
    )
    .bind(task_name)
    .fetch_optional(pool)
    .await
    .context("latest_for_task failed")?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(ScheduledTaskExecution {
        id: row.try_get("id")?,
        task_name: row.try_get("task_name")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
        status: row.try_get("status")?,
        rows_affected: row.try_get("rows_affected")?,
        error: row.try_get("error")?,
    }))
}

pub async fn start_pairs_update(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("insert into pairs_update_log (id, started_at) values ($1, now())")
        .bind(id)
        .execute(pool)
        .await
        .context("start_pairs_update failed")?;
    Ok(())
}

pub async fn finish_pairs_update(
    pool: &PgPool,
    id: Uuid,
    symbols_added: i32,
    symbols_removed: i32,
    symbols_total: i32,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        update pairs_update_log
           set finished_at = now(),
               symbols_added = $1,
               symbols_removed = $2,
               symbols_total = $3,
               error = $4
         where id = $5
        "#,
    )
    .bind(symbols_added)
    .bind(symbols_removed)
    .bind(symbols_total)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await
    .context("finish_pairs_update failed")?;
    Ok(())
}

pub async fn latest_pairs_update(pool: &PgPool) -> Result<Option<PairsUpdateLog>> {
    let row = sqlx::query(
        r#"
        select id, started_at, finished_at, symbols_added, symbols_removed,
               symbols_total, error
        from pairs_update_log
        order by started_at desc
        limit 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .context("latest_pairs_update failed")?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(PairsUpdateLog {
        id: row.try_get("id")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
        symbols_added: row.try_get("symbols_added")?,
        symbols_removed: row.try_get("symbols_removed")?,
        symbols_total: row.try_get("symbols_total")?,
        error: row.try_get("error")?,
    }))
}

/// `true` if the latest pairs-update run is stale beyond `ttl` — the signal
/// `pqp-coinreg` uses to decide whether a fresh refresh is due.
pub fn is_stale(latest_started_at: Option<DateTime<Utc>>, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
    match latest_started_at {
        Some(t) => now > t + ttl,
        None => true,
    }
}

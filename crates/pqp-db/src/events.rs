//! The append-only `StrategyEvent` log (Invariant 6) plus the aggregate
//! queries `pqp-audit`/`pqp-cli` compute purely from it — pipeline
//! throughput and failure-breakdown, with no separate metrics table.

use anyhow::Context;
use anyhow::Result;
use chrono::{DateTime, Utc};
use pqp_schemas::StrategyEvent;
use sqlx::{PgPool, Row};

pub async fn insert_event(pool: &PgPool, ev: &StrategyEvent) -> Result<()> {
    sqlx::query(
        r#"
        insert into strategy_events (
            event_id, ts, strategy_id, strategy_name, base_code_hash,
            event_type, stage, status, duration_ms, detail
        ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        "#,
    )
    .bind(ev.event_id)
    .bind(ev.ts)
    .bind(ev.strategy_id)
    .bind(&ev.strategy_name)
    .bind(&ev.base_code_hash)
    .bind(&ev.event_type)
    .bind(&ev.stage)
    .bind(&ev.status)
    .bind(ev.duration_ms)
    .bind(&ev.detail)
    .execute(pool)
    .await
    .context("strategy_events insert failed")?;
    Ok(())
}

fn row_to_event(row: sqlx::postgres::PgRow) -> Result<StrategyEvent> {
    Ok(StrategyEvent {
        event_id: row.try_get("event_id")?,
        ts: row.try_get("ts")?,
        strategy_id: row.try_get("strategy_id")?,
        strategy_name: row.try_get("strategy_name")?,
        base_code_hash: row.try_get("base_code_hash")?,
        event_type: row.try_get("event_type")?,
        stage: row.try_get("stage")?,
        status: row.try_get("status")?,
        duration_ms: row.try_get("duration_ms")?,
        detail: row.try_get("detail")?,
    })
}

pub async fn range_by_timestamp(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<StrategyEvent>> {
    let rows = sqlx::query(
        r#"
        select event_id, ts, strategy_id, strategy_name, base_code_hash,
               event_type, stage, status, duration_ms, detail
        from strategy_events
        where ts >= $1 and ts < $2
        order by ts asc
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("range_by_timestamp failed")?;

    rows.into_iter().map(row_to_event).collect()
}

pub async fn for_strategy_name(pool: &PgPool, strategy_name: &str) -> Result<Vec<StrategyEvent>> {
    let rows = sqlx::query(
        r#"
        select event_id, ts, strategy_id, strategy_name, base_code_hash,
               event_type, stage, status, duration_ms, detail
        from strategy_events
        where strategy_name = $1
        order by ts asc
        "#,
    )
    .bind(strategy_name)
    .fetch_all(pool)
    .await
    .context("for_strategy_name failed")?;

    rows.into_iter().map(row_to_event).collect()
}

pub async fn for_stage_status(pool: &PgPool, stage: &str, status: &str) -> Result<Vec<StrategyEvent>> {
    let rows = sqlx::query(
        r#"
        select event_id, ts, strategy_id, strategy_name, base_code_hash,
               event_type, stage, status, duration_ms, detail
        from strategy_events
        where stage = $1 and status = $2
        order by ts asc
        "#,
    )
    .bind(stage)
    .bind(status)
    .fetch_all(pool)
    .await
    .context("for_stage_status failed")?;

    rows.into_iter().map(row_to_event).collect()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StageThroughput {
    pub stage: String,
    pub status: String,
    pub count: i64,
}

/// Count of events per `(stage, status)` in `[from, to)`, the input to the
/// pipeline-throughput view the Classifier/operators watch.
pub async fn pipeline_throughput(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<StageThroughput>> {
    let rows = sqlx::query(
        r#"
        select stage, status, count(*)::bigint as count
        from strategy_events
        where ts >= $1 and ts < $2
        group by stage, status
        order by stage, status
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("pipeline_throughput failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(StageThroughput {
            stage: row.try_get("stage")?,
            status: row.try_get("status")?,
            count: row.try_get("count")?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FailureBreakdown {
    pub stage: String,
    pub event_type: String,
    pub count: i64,
}

/// Count of `status = 'failed'` events grouped by `(stage, event_type)` in
/// `[from, to)` — surfaces which stage/reason is driving attrition.
pub async fn failure_breakdown(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<FailureBreakdown>> {
    let rows = sqlx::query(
        r#"
        select stage, event_type, count(*)::bigint as count
        from strategy_events
        where ts >= $1 and ts < $2 and status = 'failed'
        group by stage, event_type
        order by count desc
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("failure_breakdown failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(FailureBreakdown {
            stage: row.try_get("stage")?,
            event_type: row.try_get("event_type")?,
            count: row.try_get("count")?,
        });
    }
    Ok(out)
}

//! Strategy CRUD and the claim/lease protocol every stage uses to pull its
//! next unit of work (Invariant 2: at most one worker holds a row at a time).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use pqp_schemas::{BarInterval, Strategy, StrategyStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub async fn insert_strategy(pool: &PgPool, s: &Strategy) -> Result<()> {
    sqlx::query(
        r#"
        insert into strategies (
            id, name, category, bar_interval, source, template_id, params,
            base_code_hash, status, processing_by, processing_started_at,
            generated_at, validated_at, tested_at, selected_at, live_at,
            retired_at, symbols, optimal_bar_interval
        ) values (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19
        )
        "#,
    )
    .bind(s.id)
    .bind(&s.name)
    .bind(s.category.as_str())
    .bind(s.bar_interval)
    .bind(&s.source)
    .bind(s.template_id)
    .bind(&s.params)
    .bind(&s.base_code_hash)
    .bind(s.status)
    .bind(&s.processing_by)
    .bind(s.processing_started_at)
    .bind(s.generated_at)
    .bind(s.validated_at)
    .bind(s.tested_at)
    .bind(s.selected_at)
    .bind(s.live_at)
    .bind(s.retired_at)
    .bind(&s.symbols)
    .bind(s.optimal_bar_interval)
    .execute(pool)
    .await
    .context("insert_strategy failed")?;
    Ok(())
}

fn row_to_strategy(row: sqlx::postgres::PgRow) -> Result<Strategy> {
    Ok(Strategy {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        bar_interval: row.try_get("bar_interval")?,
        source: row.try_get("source")?,
        template_id: row.try_get("template_id")?,
        params: row.try_get("params")?,
        base_code_hash: row.try_get("base_code_hash")?,
        status: row.try_get("status")?,
        processing_by: row.try_get("processing_by")?,
        processing_started_at: row.try_get("processing_started_at")?,
        generated_at: row.try_get("generated_at")?,
        validated_at: row.try_get("validated_at")?,
        tested_at: row.try_get("tested_at")?,
        selected_at: row.try_get("selected_at")?,
        live_at: row.try_get("live_at")?,
        retired_at: row.try_get("retired_at")?,
        symbols: row.try_get("symbols")?,
        optimal_bar_interval: row.try_get("optimal_bar_interval")?,
    })
}

pub async fn fetch_strategy(pool: &PgPool, id: Uuid) -> Result<Strategy> {
    let row = sqlx::query(
        r#"
        select id, name, category, bar_interval, source, template_id, params,
               base_code_hash, status, processing_by, processing_started_at,
               generated_at, validated_at, tested_at, selected_at, live_at,
               retired_at, symbols, optimal_bar_interval
        from strategies
        where id = $1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .context("fetch_strategy failed")?;
    row_to_strategy(row)
}

/// Atomically claim one strategy currently in `status`, skipping rows held by
/// another worker whose lease has not yet expired. Uses `FOR UPDATE SKIP
/// LOCKED` so concurrent claimers never race on the same row (Invariant 2).
///
/// Oldest-row-first by the timestamp column matching `status` (FIFO per stage).
pub async fn claim_one(
    pool: &PgPool,
    status: StrategyStatus,
    worker_id: &str,
    lease_ttl: Duration,
) -> Result<Option<Strategy>> {
    let ttl_secs = lease_ttl.num_seconds();
    let order_column = order_column_for(status);

    let sql = format!(
        r#"
        with candidate as (
            select id
            from strategies
            where status = $1
              and (processing_by is null
                   or processing_started_at < now() - make_interval(secs => $2))
            order by {order_column} asc nulls first
            limit 1
            for update skip locked
        )
        update strategies
           set processing_by = $3,
               processing_started_at = now()
         where id = (select id from candidate)
        returning id, name, category, bar_interval, source, template_id, params,
                  base_code_hash, status, processing_by, processing_started_at,
                  generated_at, validated_at, tested_at, selected_at, live_at,
                  retired_at, symbols, optimal_bar_interval
        "#
    );

    let row = sqlx::query(&sql)
        .bind(status)
        .bind(ttl_secs)
        .bind(worker_id)
        .fetch_optional(pool)
        .await
        .context("claim_one failed")?;

    match row {
        Some(r) => Ok(Some(row_to_strategy(r)?)),
        None => Ok(None),
    }
}

fn order_column_for(status: StrategyStatus) -> &'static str {
    match status {
        StrategyStatus::Generated => "generated_at",
        StrategyStatus::Validated => "validated_at",
        StrategyStatus::Tested => "tested_at",
        StrategyStatus::Selected => "selected_at",
        StrategyStatus::Live => "live_at",
        StrategyStatus::Retired | StrategyStatus::Failed => "retired_at",
    }
}

/// Release a claimed row's lease without changing its status (used when a
/// worker fails before finishing its unit of work).
pub async fn release_lease(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        update strategies
           set processing_by = null,
               processing_started_at = null
         where id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .context("release_lease failed")?;
    Ok(())
}

/// Advance a strategy's status, stamping the matching timestamp column and
/// clearing its lease. Rejects any transition `StrategyStatus::can_transition_to`
/// disallows (Invariant 1).
pub async fn advance_status(pool: &PgPool, id: Uuid, next: StrategyStatus) -> Result<()> {
    let current = fetch_strategy(pool, id).await?;
    if !current.status.can_transition_to(next) {
        return Err(anyhow!(
            "illegal strategy transition {:?} -> {:?} for {id}",
            current.status,
            next
        ));
    }

    let ts_column = match next {
        StrategyStatus::Generated => None,
        StrategyStatus::Validated => Some("validated_at"),
        StrategyStatus::Tested => Some("tested_at"),
        StrategyStatus::Selected => Some("selected_at"),
        StrategyStatus::Live => Some("live_at"),
        StrategyStatus::Retired => Some("retired_at"),
        StrategyStatus::Failed => None,
    };

    let sql = match ts_column {
        Some(col) => format!(
            "update strategies set status = $1, {col} = now(), processing_by = null, \
             processing_started_at = null where id = $2"
        ),
        None => "update strategies set status = $1, processing_by = null, \
                 processing_started_at = null where id = $2"
            .to_string(),
    };

    sqlx::query(&sql)
        .bind(next)
        .bind(id)
        .execute(pool)
        .await
        .context("advance_status failed")?;
    Ok(())
}

/// Set a strategy's `optimal_bar_interval`, discovered once its full interval
/// sweep (§4.4 step 3) has run.
pub async fn set_optimal_bar_interval(
    pool: &PgPool,
    id: Uuid,
    interval: BarInterval,
) -> Result<()> {
    sqlx::query("update strategies set optimal_bar_interval = $1 where id = $2")
        .bind(interval)
        .bind(id)
        .execute(pool)
        .await
        .context("set_optimal_bar_interval failed")?;
    Ok(())
}

/// Count strategies whose `base_code_hash` matches, used by the Generator's
/// parametric dedup check before synthesising a near-duplicate.
pub async fn count_by_base_code_hash(pool: &PgPool, base_code_hash: &str) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("select count(*)::bigint from strategies where base_code_hash = $1")
        .bind(base_code_hash)
        .fetch_one(pool)
        .await
        .context("count_by_base_code_hash failed")?;
    Ok(n)
}

/// Count strategies currently sitting in `status`, used as the downstream
/// queue depth every claiming role's `pqp-runtime::cooldown` backpressure
/// check is computed against.
pub async fn count_by_status(pool: &PgPool, status: StrategyStatus) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("select count(*)::bigint from strategies where status = $1")
        .bind(status)
        .fetch_one(pool)
        .await
        .context("count_by_status failed")?;
    Ok(n)
}

/// Count live strategies in `category` at `bar_interval`, used by the
/// Classifier's diversification cap (§4.5 step 2).
pub async fn count_live_by_category_interval(
    pool: &PgPool,
    category: &str,
    bar_interval: BarInterval,
) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        select count(*)::bigint
        from strategies
        where status = 'LIVE' and category = $1 and bar_interval = $2
        "#,
    )
    .bind(category)
    .bind(bar_interval)
    .fetch_one(pool)
    .await
    .context("count_live_by_category_interval failed")?;
    Ok(n)
}

pub async fn list_live_strategies(pool: &PgPool) -> Result<Vec<Strategy>> {
    list_by_status(pool, StrategyStatus::Live).await
}

/// List every strategy currently in `status`, oldest-first by that status's
/// timestamp column. Used by the Classifier's ranking pass (§4.5 step 3) to
/// pull the full `Tested`/`Selected` survivor pool.
pub async fn list_by_status(pool: &PgPool, status: StrategyStatus) -> Result<Vec<Strategy>> {
    let order_column = order_column_for(status);
    let sql = format!(
        r#"
        select id, name, category, bar_interval, source, template_id, params,
               base_code_hash, status, processing_by, processing_started_at,
               generated_at, validated_at, tested_at, selected_at, live_at,
               retired_at, symbols, optimal_bar_interval
        from strategies
        where status = $1
        order by {order_column} asc nulls first
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(status)
        .fetch_all(pool)
        .await
        .context("list_by_status failed")?;

    rows.into_iter().map(row_to_strategy).collect()
}

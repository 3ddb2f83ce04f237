//! Subaccount CRUD. Allocation (Invariant 3: at most one `LIVE` strategy per
//! subaccount) is enforced by `uq_subaccounts_strategy_id`; this module only
//! exposes the claim as a single round trip so the Deployer can't race itself.

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use pqp_schemas::Subaccount;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_subaccount(row: sqlx::postgres::PgRow) -> Result<Subaccount> {
    Ok(Subaccount {
        id: row.try_get("id")?,
        status: row.try_get("status")?,
        strategy_id: row.try_get("strategy_id")?,
        allocated_capital: row.try_get("allocated_capital")?,
        current_balance: row.try_get("current_balance")?,
        peak_balance: row.try_get("peak_balance")?,
        peak_balance_updated_at: row.try_get("peak_balance_updated_at")?,
        daily_pnl: row.try_get("daily_pnl")?,
        daily_pnl_reset_date: row.try_get("daily_pnl_reset_date")?,
    })
}

pub async fn insert(pool: &PgPool, s: &Subaccount) -> Result<()> {
    sqlx::query(
        r#"
        insert into subaccounts (
            id, status, strategy_id, allocated_capital, current_balance,
            peak_balance, peak_balance_updated_at, daily_pnl, daily_pnl_reset_date
        ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        "#,
    )
    .bind(s.id)
    .bind(s.status)
    .bind(s.strategy_id)
    .bind(s.allocated_capital)
    .bind(s.current_balance)
    .bind(s.peak_balance)
    .bind(s.peak_balance_updated_at)
    .bind(s.daily_pnl)
    .bind(s.daily_pnl_reset_date)
    .execute(pool)
    .await
    .context("subaccounts insert failed")?;
    Ok(())
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Subaccount> {
    let row = sqlx::query(
        r#"
        select id, status, strategy_id, allocated_capital, current_balance,
               peak_balance, peak_balance_updated_at, daily_pnl, daily_pnl_reset_date
        from subaccounts
        where id = $1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .context("subaccounts fetch failed")?;
    row_to_subaccount(row)
}

/// Atomically claim a free (`ACTIVE`, unassigned) subaccount for `strategy_id`.
/// Returns `None` if none are free — the Deployer must then wait or allocate
/// a new one, never oversubscribe an occupied row.
pub async fn claim_free_for_strategy(
    pool: &PgPool,
    strategy_id: Uuid,
) -> Result<Option<Subaccount>> {
    let row = sqlx::query(
        r#"
        with candidate as (
            select id
            from subaccounts
            where status = 'ACTIVE' and strategy_id is null
            order by id asc
            limit 1
            for update skip locked
        )
        update subaccounts
           set strategy_id = $1
         where id = (select id from candidate)
        returning id, status, strategy_id, allocated_capital, current_balance,
                  peak_balance, peak_balance_updated_at, daily_pnl, daily_pnl_reset_date
        "#,
    )
    .bind(strategy_id)
    .fetch_optional(pool)
    .await
    .context("claim_free_for_strategy failed")?;

    match row {
        Some(r) => Ok(Some(row_to_subaccount(r)?)),
        None => Ok(None),
    }
}

/// Find the subaccount currently assigned to `strategy_id`, if any. Used by
/// the Classifier's retirement step (§4.5 step 2) to free it on retirement.
pub async fn fetch_by_strategy_id(pool: &PgPool, strategy_id: Uuid) -> Result<Option<Subaccount>> {
    let row = sqlx::query(
        r#"
        select id, status, strategy_id, allocated_capital, current_balance,
               peak_balance, peak_balance_updated_at, daily_pnl, daily_pnl_reset_date
        from subaccounts
        where strategy_id = $1
        "#,
    )
    .bind(strategy_id)
    .fetch_optional(pool)
    .await
    .context("fetch_by_strategy_id failed")?;

    match row {
        Some(r) => Ok(Some(row_to_subaccount(r)?)),
        None => Ok(None),
    }
}

/// Deployer-only initialisation (§4.6): a subaccount just claimed for a
/// strategy has no balance history yet, so `current_balance`/`peak_balance`
/// are both seeded to the tier's capital rather than read from the venue.
pub async fn initialize_capital(pool: &PgPool, id: Uuid, capital: Decimal) -> Result<()> {
    sqlx::query(
        r#"
        update subaccounts
           set allocated_capital = $1,
               current_balance = $1,
               peak_balance = $1,
               peak_balance_updated_at = now()
         where id = $2
        "#,
    )
    .bind(capital)
    .bind(id)
    .execute(pool)
    .await
    .context("initialize_capital failed")?;
    Ok(())
}

/// Release a subaccount back to the free pool (strategy retired).
pub async fn release(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("update subaccounts set strategy_id = null where id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("subaccounts release failed")?;
    Ok(())
}

/// Advance `current_balance`/`peak_balance` after a fill (Invariant 4: peak
/// never regresses, enforced in SQL via `greatest`).
pub async fn apply_balance_delta(pool: &PgPool, id: Uuid, delta: Decimal) -> Result<()> {
    sqlx::query(
        r#"
        update subaccounts
           set current_balance = current_balance + $1,
               daily_pnl = daily_pnl + $1,
               peak_balance = greatest(peak_balance, current_balance + $1),
               peak_balance_updated_at = case
                   when current_balance + $1 > peak_balance then now()
                   else peak_balance_updated_at
               end
         where id = $2
        "#,
    )
    .bind(delta)
    .bind(id)
    .execute(pool)
    .await
    .context("apply_balance_delta failed")?;
    Ok(())
}

/// Reset `daily_pnl` for every subaccount whose reset date has rolled past
/// `today` (called once per day by the Executor's scheduler).
pub async fn roll_daily_pnl(pool: &PgPool, today: NaiveDate) -> Result<u64> {
    let result = sqlx::query(
        r#"
        update subaccounts
           set daily_pnl = 0,
               daily_pnl_reset_date = $1
         where daily_pnl_reset_date is distinct from $1
        "#,
    )
    .bind(today)
    .execute(pool)
    .await
    .context("roll_daily_pnl failed")?;
    Ok(result.rows_affected())
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: pqp_schemas::SubaccountStatus,
) -> Result<()> {
    sqlx::query("update subaccounts set status = $1 where id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .context("subaccounts set_status failed")?;
    Ok(())
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Subaccount>> {
    let rows = sqlx::query(
        r#"
        select id, status, strategy_id, allocated_capital, current_balance,
               peak_balance, peak_balance_updated_at, daily_pnl, daily_pnl_reset_date
        from subaccounts
        order by id asc
        "#,
    )
    .fetch_all(pool)
    .await
    .context("subaccounts list_all failed")?;

    rows.into_iter().map(row_to_subaccount).collect()
}

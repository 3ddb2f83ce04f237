//! Trade rows, owned exclusively by the Executor (§4.7 "state ownership").
//! `pqp-db` enforces nothing about who writes here beyond the schema; the
//! ownership rule is a convention the Executor alone is expected to honour.

use anyhow::{Context, Result};
use pqp_schemas::{ExitReason, Trade};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_trade(row: sqlx::postgres::PgRow) -> Result<Trade> {
    Ok(Trade {
        id: row.try_get("id")?,
        strategy_id: row.try_get("strategy_id")?,
        subaccount_id: row.try_get("subaccount_id")?,
        symbol: row.try_get("symbol")?,
        direction: row.try_get("direction")?,
        entry_time: row.try_get("entry_time")?,
        entry_price: row.try_get("entry_price")?,
        entry_size: row.try_get("entry_size")?,
        stop_loss_price: row.try_get("stop_loss_price")?,
        take_profit_price: row.try_get("take_profit_price")?,
        exit_time: row.try_get("exit_time")?,
        exit_price: row.try_get("exit_price")?,
        exit_reason: row.try_get("exit_reason")?,
        realized_pnl: row.try_get("realized_pnl")?,
        realized_pnl_ratio: row.try_get("realized_pnl_ratio")?,
        leverage: row.try_get("leverage")?,
        entry_fee: row.try_get("entry_fee")?,
        exit_fee: row.try_get("exit_fee")?,
        duration_secs: row.try_get("duration_secs")?,
        venue_dedup_id: row.try_get("venue_dedup_id")?,
    })
}

/// Open a new trade. `venue_dedup_id` is unique, so a retried fill with the
/// same id is rejected by the database rather than double-counted.
pub async fn open_trade(pool: &PgPool, t: &Trade) -> Result<()> {
    sqlx::query(
        r#"
        insert into trades (
            id, strategy_id, subaccount_id, symbol, direction, entry_time,
            entry_price, entry_size, stop_loss_price, take_profit_price,
            leverage, entry_fee, venue_dedup_id
        ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        "#,
    )
    .bind(t.id)
    .bind(t.strategy_id)
    .bind(t.subaccount_id)
    .bind(&t.symbol)
    .bind(t.direction)
    .bind(t.entry_time)
    .bind(t.entry_price)
    .bind(t.entry_size)
    .bind(t.stop_loss_price)
    .bind(t.take_profit_price)
    .bind(t.leverage)
    .bind(t.entry_fee)
    .bind(&t.venue_dedup_id)
    .execute(pool)
    .await
    .context("open_trade failed")?;
    Ok(())
}

pub async fn close_trade(
    pool: &PgPool,
    id: Uuid,
    exit_time: chrono::DateTime<chrono::Utc>,
    exit_price: rust_decimal::Decimal,
    exit_reason: ExitReason,
    realized_pnl: rust_decimal::Decimal,
    realized_pnl_ratio: rust_decimal::Decimal,
    exit_fee: rust_decimal::Decimal,
    duration_secs: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        update trades
           set exit_time = $1,
               exit_price = $2,
               exit_reason = $3,
               realized_pnl = $4,
               realized_pnl_ratio = $5,
               exit_fee = $6,
               duration_secs = $7
         where id = $8
        "#,
    )
    .bind(exit_time)
    .bind(exit_price)
    .bind(exit_reason)
    .bind(realized_pnl)
    .bind(realized_pnl_ratio)
    .bind(exit_fee)
    .bind(duration_secs)
    .bind(id)
    .execute(pool)
    .await
    .context("close_trade failed")?;
    Ok(())
}

pub async fn list_open_for_subaccount(pool: &PgPool, subaccount_id: Uuid) -> Result<Vec<Trade>> {
    let rows = sqlx::query(
        r#"
        select id, strategy_id, subaccount_id, symbol, direction, entry_time,
               entry_price, entry_size, stop_loss_price, take_profit_price,
               exit_time, exit_price, exit_reason, realized_pnl, realized_pnl_ratio,
               leverage, entry_fee, exit_fee, duration_secs, venue_dedup_id
        from trades
        where subaccount_id = $1 and exit_time is null
        order by entry_time asc
        "#,
    )
    .bind(subaccount_id)
    .fetch_all(pool)
    .await
    .context("list_open_for_subaccount failed")?;

    rows.into_iter().map(row_to_trade).collect()
}

pub async fn list_closed_for_strategy(pool: &PgPool, strategy_id: Uuid) -> Result<Vec<Trade>> {
    let rows = sqlx::query(
        r#"
        select id, strategy_id, subaccount_id, symbol, direction, entry_time,
               entry_price, entry_size, stop_loss_price, take_profit_price,
               exit_time, exit_price, exit_reason, realized_pnl, realized_pnl_ratio,
               leverage, entry_fee, exit_fee, duration_secs, venue_dedup_id
        from trades
        where strategy_id = $1 and exit_time is not null
        order by exit_time asc
        "#,
    )
    .bind(strategy_id)
    .fetch_all(pool)
    .await
    .context("list_closed_for_strategy failed")?;

    rows.into_iter().map(row_to_trade).collect()
}

/// Exists purely so a retried fill can be recognised without inserting twice
/// (the unique index on `venue_dedup_id` is the actual guard).
pub async fn trade_exists_for_venue_dedup_id(pool: &PgPool, venue_dedup_id: &str) -> Result<bool> {
    let (n,): (i64,) =
        sqlx::query_as("select count(*)::bigint from trades where venue_dedup_id = $1")
            .bind(venue_dedup_id)
            .fetch_one(pool)
            .await
            .context("trade_exists_for_venue_dedup_id failed")?;
    Ok(n > 0)
}

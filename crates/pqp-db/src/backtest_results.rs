//! Per-(strategy, period, interval) backtest rows, including the
//! full/recent pairing used by the recency-weighted scoring rubric
//! (Invariant 7).

use anyhow::Context;
use anyhow::Result;
use pqp_schemas::BacktestResult;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_result(row: sqlx::postgres::PgRow) -> Result<BacktestResult> {
    Ok(BacktestResult {
        id: row.try_get("id")?,
        strategy_id: row.try_get("strategy_id")?,
        period_type: row.try_get("period_type")?,
        sharpe: row.try_get("sharpe")?,
        win_rate: row.try_get("win_rate")?,
        expectancy: row.try_get("expectancy")?,
        drawdown: row.try_get("drawdown")?,
        trade_count: row.try_get("trade_count")?,
        total_return: row.try_get("total_return")?,
        walk_forward_stability: row.try_get("walk_forward_stability")?,
        symbols_tested: row.try_get("symbols_tested")?,
        bar_interval_tested: row.try_get("bar_interval_tested")?,
        is_optimal_interval: row.try_get("is_optimal_interval")?,
        weighted_sharpe: row.try_get("weighted_sharpe")?,
        weighted_win_rate: row.try_get("weighted_win_rate")?,
        weighted_expectancy: row.try_get("weighted_expectancy")?,
        recency_ratio: row.try_get("recency_ratio")?,
        recency_penalty: row.try_get("recency_penalty")?,
        full_result_id: row.try_get("full_result_id")?,
        recent_result_id: row.try_get("recent_result_id")?,
    })
}

pub async fn insert(pool: &PgPool, r: &BacktestResult) -> Result<()> {
    sqlx::query(
        r#"
        insert into backtest_results (
            id, strategy_id, period_type, sharpe, win_rate, expectancy, drawdown,
            trade_count, total_return, walk_forward_stability, symbols_tested,
            bar_interval_tested, is_optimal_interval, weighted_sharpe,
            weighted_win_rate, weighted_expectancy, recency_ratio, recency_penalty,
            full_result_id, recent_result_id
        ) values (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20
        )
        "#,
    )
    .bind(r.id)
    .bind(r.strategy_id)
    .bind(r.period_type)
    .bind(r.sharpe)
    .bind(r.win_rate)
    .bind(r.expectancy)
    .bind(r.drawdown)
    .bind(r.trade_count)
    .bind(r.total_return)
    .bind(r.walk_forward_stability)
    .bind(&r.symbols_tested)
    .bind(r.bar_interval_tested)
    .bind(r.is_optimal_interval)
    .bind(r.weighted_sharpe)
    .bind(r.weighted_win_rate)
    .bind(r.weighted_expectancy)
    .bind(r.recency_ratio)
    .bind(r.recency_penalty)
    .bind(r.full_result_id)
    .bind(r.recent_result_id)
    .execute(pool)
    .await
    .context("backtest_results insert failed")?;
    Ok(())
}

/// Stamp a `full` row with the id of its paired `recent` row once computed.
pub async fn link_recent_result(pool: &PgPool, full_id: Uuid, recent_id: Uuid) -> Result<()> {
    sqlx::query("update backtest_results set recent_result_id = $1 where id = $2")
        .bind(recent_id)
        .bind(full_id)
        .execute(pool)
        .await
        .context("link_recent_result failed")?;
    Ok(())
}

pub async fn list_for_strategy(pool: &PgPool, strategy_id: Uuid) -> Result<Vec<BacktestResult>> {
    let rows = sqlx::query(
        r#"
        select id, strategy_id, period_type, sharpe, win_rate, expectancy, drawdown,
               trade_count, total_return, walk_forward_stability, symbols_tested,
               bar_interval_tested, is_optimal_interval, weighted_sharpe,
               weighted_win_rate, weighted_expectancy, recency_ratio, recency_penalty,
               full_result_id, recent_result_id
        from backtest_results
        where strategy_id = $1
        order by created_at asc
        "#,
    )
    .bind(strategy_id)
    .fetch_all(pool)
    .await
    .context("list_for_strategy failed")?;

    rows.into_iter().map(row_to_result).collect()
}

/// The most recent `full`-period result for a strategy at its optimal
/// interval, used by the Classifier's scoring pass (§4.5 step 1).
pub async fn latest_full_result(
    pool: &PgPool,
    strategy_id: Uuid,
) -> Result<Option<BacktestResult>> {
    let row = sqlx::query(
        r#"
        select id, strategy_id, period_type, sharpe, win_rate, expectancy, drawdown,
               trade_count, total_return, walk_forward_stability, symbols_tested,
               bar_interval_tested, is_optimal_interval, weighted_sharpe,
               weighted_win_rate, weighted_expectancy, recency_ratio, recency_penalty,
               full_result_id, recent_result_id
        from backtest_results
        where strategy_id = $1 and period_type = 'full'
        order by created_at desc
        limit 1
        "#,
    )
    .bind(strategy_id)
    .fetch_optional(pool)
    .await
    .context("latest_full_result failed")?;

    match row {
        Some(r) => Ok(Some(row_to_result(r)?)),
        None => Ok(None),
    }
}

/// The most recent `recent`-period result for a strategy, used by the
/// Classifier's ranking pass (§4.5 step 3) — admission and promotion
/// decisions score off the recency-weighted window, not the full history.
pub async fn latest_recent_result(
    pool: &PgPool,
    strategy_id: Uuid,
) -> Result<Option<BacktestResult>> {
    let row = sqlx::query(
        r#"
        select id, strategy_id, period_type, sharpe, win_rate, expectancy, drawdown,
               trade_count, total_return, walk_forward_stability, symbols_tested,
               bar_interval_tested, is_optimal_interval, weighted_sharpe,
               weighted_win_rate, weighted_expectancy, recency_ratio, recency_penalty,
               full_result_id, recent_result_id
        from backtest_results
        where strategy_id = $1 and period_type = 'recent'
        order by created_at desc
        limit 1
        "#,
    )
    .bind(strategy_id)
    .fetch_optional(pool)
    .await
    .context("latest_recent_result failed")?;

    match row {
        Some(r) => Ok(Some(row_to_result(r)?)),
        None => Ok(None),
    }
}

//! Consecutive-below-threshold counter driving the Classifier's retirement
//! check (§4.5 step 2): a strategy is only retired on score after `N`
//! straight cycles below threshold, not the first dip.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct RetirementStrikes {
    pub strategy_id: Uuid,
    pub strikes: i32,
    pub last_score: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

pub async fn get(pool: &PgPool, strategy_id: Uuid) -> Result<Option<RetirementStrikes>> {
    let row = sqlx::query(
        "select strategy_id, strikes, last_score, updated_at from retirement_strikes where strategy_id = $1",
    )
    .bind(strategy_id)
    .fetch_optional(pool)
    .await
    .context("retirement_strikes get failed")?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(RetirementStrikes {
        strategy_id: row.try_get("strategy_id")?,
        strikes: row.try_get("strikes")?,
        last_score: row.try_get("last_score")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

/// Record a below-threshold cycle, incrementing the strike counter.
pub async fn record_strike(pool: &PgPool, strategy_id: Uuid, score: f64) -> Result<i32> {
    let (strikes,): (i32,) = sqlx::query_as(
        r#"
        insert into retirement_strikes (strategy_id, strikes, last_score, updated_at)
        values ($1, 1, $2, now())
        on conflict (strategy_id) do update
            set strikes = retirement_strikes.strikes + 1,
                last_score = excluded.last_score,
                updated_at = now()
        returning strikes
        "#,
    )
    .bind(strategy_id)
    .bind(score)
    .fetch_one(pool)
    .await
    .context("retirement_strikes record_strike failed")?;
    Ok(strikes)
}

/// Reset the strike counter once a strategy's score recovers above threshold.
pub async fn reset(pool: &PgPool, strategy_id: Uuid, score: f64) -> Result<()> {
    sqlx::query(
        r#"
        insert into retirement_strikes (strategy_id, strikes, last_score, updated_at)
        values ($1, 0, $2, now())
        on conflict (strategy_id) do update
            set strikes = 0,
                last_score = excluded.last_score,
                updated_at = now()
        "#,
    )
    .bind(strategy_id)
    .bind(score)
    .execute(pool)
    .await
    .context("retirement_strikes reset failed")?;
    Ok(())
}

/// Drop the row once a strategy retires (its strike history no longer matters).
pub async fn delete(pool: &PgPool, strategy_id: Uuid) -> Result<()> {
    sqlx::query("delete from retirement_strikes where strategy_id = $1")
        .bind(strategy_id)
        .execute(pool)
        .await
        .context("retirement_strikes delete failed")?;
    Ok(())
}

//! The tradable-coin universe (`coins`), refreshed by the pairs-update job
//! and read by `pqp-coinreg`'s TTL+DB-staleness cache.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Coin {
    pub symbol: String,
    pub max_leverage: i32,
    pub volume_24h: Decimal,
    pub price: Decimal,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Upsert one coin row, used by the pairs-update job per refreshed symbol.
pub async fn upsert_coin(pool: &PgPool, c: &Coin) -> Result<()> {
    sqlx::query(
        r#"
        insert into coins (symbol, max_leverage, volume_24h, price, is_active, updated_at)
        values ($1,$2,$3,$4,$5,now())
        on conflict (symbol) do update
            set max_leverage = excluded.max_leverage,
                volume_24h = excluded.volume_24h,
                price = excluded.price,
                is_active = excluded.is_active,
                updated_at = now()
        "#,
    )
    .bind(&c.symbol)
    .bind(c.max_leverage)
    .bind(c.volume_24h)
    .bind(c.price)
    .bind(c.is_active)
    .execute(pool)
    .await
    .context("upsert_coin failed")?;
    Ok(())
}

/// All active coins, ordered by volume descending then symbol ascending for
/// deterministic ties — the same ordering the top-N selection relies on.
pub async fn list_active_by_volume(pool: &PgPool) -> Result<Vec<Coin>> {
    sqlx::query_as::<_, Coin>(
        r#"
        select symbol, max_leverage, volume_24h, price, is_active, updated_at
        from coins
        where is_active
        order by volume_24h desc, symbol asc
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list_active_by_volume failed")
}

/// Latest `updated_at` across all coins, `None` if the table is empty. This
/// is the DB-staleness signal: a cache newer than this value (even if past
/// its own TTL) has not missed any refresh.
pub async fn latest_updated_at(pool: &PgPool) -> Result<Option<DateTime<Utc>>> {
    let row = sqlx::query("select max(updated_at) as m from coins")
        .fetch_one(pool)
        .await
        .context("latest_updated_at failed")?;
    row.try_get("m").context("latest_updated_at column missing")
}

//! pqp-db
//!
//! Postgres persistence for every pipeline role. Each aggregate (strategies,
//! validation cache, backtest results, trades, subaccounts, emergency-stop
//! state, the event log, scheduled-task bookkeeping, market-data bars) gets
//! its own module; `lib.rs` owns connection setup, migrations, and the
//! claim/lease protocol shared by the stage transitions.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub const ENV_DB_URL: &str = "PQP_DATABASE_URL";

pub mod backtest_results;
pub mod coins;
pub mod emergency_stop;
pub mod events;
pub mod md;
pub mod retirement_strikes;
pub mod subaccounts;
pub mod strategies;
pub mod tasks;
pub mod trades;
pub mod validation_cache;

pub use backtest_results::*;
pub use coins::*;
pub use emergency_stop::*;
pub use events::*;
pub use md::{
    fetch_md_bars, ingest_csv_to_md_bars, ingest_provider_bars_to_md_bars, CoverageTotals,
    FetchMdBarsArgs, IngestCsvArgs, IngestProviderBarsArgs, IngestResult, MdBarRow,
    MdQualityReport, ProviderBar,
};
pub use retirement_strikes::*;
pub use strategies::*;
pub use subaccounts::*;
pub use tasks::*;
pub use trades::*;
pub use validation_cache::*;

/// Connect to Postgres using `PQP_DATABASE_URL`.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Test helper: connect using `PQP_DATABASE_URL` and ensure migrations are applied.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let pool = connect_from_env().await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='strategies'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_strategies_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_strategies_table: bool,
}

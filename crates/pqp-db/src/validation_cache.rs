//! Shuffle-test cache keyed by `code_hash` (Invariant 5): any strategy sharing
//! a hash inherits the cached pass/fail without re-execution.

use anyhow::{Context, Result};
use pqp_schemas::ValidationCache;
use sqlx::{PgPool, Row};

/// Upsert a cache row. Later writes overwrite earlier ones for the same hash
/// (a fresh stability probe can refine a previously-cached result).
pub async fn upsert(pool: &PgPool, entry: &ValidationCache) -> Result<()> {
    sqlx::query(
        r#"
        insert into validation_cache (code_hash, passed, checked_at, stability_coefficient_of_variation)
        values ($1, $2, $3, $4)
        on conflict (code_hash) do update
            set passed = excluded.passed,
                checked_at = excluded.checked_at,
                stability_coefficient_of_variation = excluded.stability_coefficient_of_variation
        "#,
    )
    .bind(&entry.code_hash)
    .bind(entry.passed)
    .bind(entry.checked_at)
    .bind(entry.stability_coefficient_of_variation)
    .execute(pool)
    .await
    .context("validation_cache upsert failed")?;
    Ok(())
}

pub async fn lookup(pool: &PgPool, code_hash: &str) -> Result<Option<ValidationCache>> {
    let row = sqlx::query(
        r#"
        select code_hash, passed, checked_at, stability_coefficient_of_variation
        from validation_cache
        where code_hash = $1
        "#,
    )
    .bind(code_hash)
    .fetch_optional(pool)
    .await
    .context("validation_cache lookup failed")?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(ValidationCache {
        code_hash: row.try_get("code_hash")?,
        passed: row.try_get("passed")?,
        checked_at: row.try_get("checked_at")?,
        stability_coefficient_of_variation: row.try_get("stability_coefficient_of_variation")?,
    }))
}

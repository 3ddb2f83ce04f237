//! Top-level orchestrator (§4.4): fetch bars, sweep bar intervals, run the
//! dual-period evaluation at the winning interval, recency-weight it, and
//! hand back the two `BacktestResult` rows plus the pool-admission verdict.
//! Persistence and status advancement are the caller's job (`pqp-cli
//! backtest`'s claim loop) — this module is pure orchestration over already
//! fetched data plus the one DB round trip to load it.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use pqp_db::{FetchMdBarsArgs, MdBarRow};
use pqp_schemas::{BacktestResult, BarInterval, PeriodType};
use pqp_strategy::{Bar, Strategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dual_period::dual_period;
use crate::recency::recency_weight;
use crate::scoring;
use crate::sweep::{best_interval, interval_sweep};
use crate::types::{BacktestRunConfig, RawMetrics};

pub struct BacktestOutcome {
    pub full: BacktestResult,
    pub recent: BacktestResult,
    /// `true` once the recency-weighted recent-period score clears
    /// `config.admission_threshold` (§4.4 step 4).
    pub admitted: bool,
}

fn bar_from_row(row: &MdBarRow) -> Bar {
    const SCALE: f64 = 1_000_000.0;
    Bar::new(
        row.end_ts,
        row.open_micros as f64 / SCALE,
        row.high_micros as f64 / SCALE,
        row.low_micros as f64 / SCALE,
        row.close_micros as f64 / SCALE,
        row.volume as f64,
    )
}

fn group_by_symbol(rows: Vec<MdBarRow>) -> BTreeMap<String, Vec<Bar>> {
    let mut out: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
    for row in rows {
        out.entry(row.symbol.clone()).or_default().push(bar_from_row(&row));
    }
    out
}

async fn fetch_bars_for_interval(pool: &PgPool, interval: BarInterval, symbols: &[String]) -> Result<BTreeMap<String, Vec<Bar>>> {
    let rows = pqp_db::fetch_md_bars(
        pool,
        FetchMdBarsArgs {
            timeframe: interval.as_str().to_string(),
            symbols: symbols.to_vec(),
            start_end_ts: None,
            end_end_ts: None,
            require_complete: true,
        },
    )
    .await
    .with_context(|| format!("fetch_md_bars failed for interval {}", interval.as_str()))?;
    Ok(group_by_symbol(rows))
}

fn build_row(
    strategy_id: Uuid,
    period_type: PeriodType,
    interval: BarInterval,
    symbols: &[String],
    raw: &RawMetrics,
    scale: f64,
    recency_ratio: Option<f64>,
) -> BacktestResult {
    BacktestResult {
        id: Uuid::new_v4(),
        strategy_id,
        period_type,
        sharpe: raw.sharpe,
        win_rate: raw.win_rate,
        expectancy: raw.expectancy,
        drawdown: raw.drawdown,
        trade_count: raw.trade_count,
        total_return: raw.total_return,
        walk_forward_stability: raw.walk_forward_stability,
        symbols_tested: symbols.to_vec(),
        bar_interval_tested: interval,
        is_optimal_interval: true,
        weighted_sharpe: raw.sharpe * scale,
        weighted_win_rate: raw.win_rate * scale,
        weighted_expectancy: raw.expectancy * scale,
        recency_ratio,
        recency_penalty: 1.0 - scale,
        full_result_id: None,
        recent_result_id: None,
    }
}

/// Runs the full §4.4 sequence for one candidate strategy and persists both
/// resulting rows, linking recent back to full (Invariant 7).
pub async fn run_for_strategy(pool: &PgPool, strategy_id: Uuid, strategy: &dyn Strategy, config: &BacktestRunConfig) -> Result<BacktestOutcome> {
    let mut by_interval = Vec::with_capacity(BarInterval::ALL.len());
    for interval in BarInterval::ALL {
        let bars = fetch_bars_for_interval(pool, interval, &config.symbols).await?;
        if bars.values().any(|b| !b.is_empty()) {
            by_interval.push((interval, bars));
        }
    }

    if by_interval.is_empty() {
        anyhow::bail!("no bars available for strategy {strategy_id} across any configured interval");
    }

    let sweep_results = interval_sweep(strategy, &by_interval);
    let winner = best_interval(&sweep_results).expect("by_interval is non-empty");
    let winning_interval = winner.interval;

    let bars_by_symbol = by_interval
        .into_iter()
        .find(|(interval, _)| *interval == winning_interval)
        .map(|(_, bars)| bars)
        .expect("winning interval came from by_interval");

    let (full_raw, recent_raw) = dual_period(strategy, &bars_by_symbol, config.recent_window_bars);
    let (scale, ratio) = recency_weight(full_raw.sharpe, recent_raw.sharpe, config.recency_max_penalty);

    let mut full = build_row(strategy_id, PeriodType::Full, winning_interval, &config.symbols, &full_raw, 1.0, None);
    let recent = build_row(strategy_id, PeriodType::Recent, winning_interval, &config.symbols, &recent_raw, scale, Some(ratio));

    pqp_db::backtest_results::insert(pool, &full).await?;
    pqp_db::backtest_results::insert(pool, &recent).await?;
    pqp_db::backtest_results::link_recent_result(pool, full.id, recent.id).await?;
    full.recent_result_id = Some(recent.id);

    let admitted = scoring::score(&recent, &config.weights) >= config.admission_threshold;

    Ok(BacktestOutcome { full, recent, admitted })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline status (§3). Forward edges only, plus a `Failed` sink from any
/// non-terminal state (Invariant 1) — enforced by [`StrategyStatus::can_transition_to`],
/// not by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum StrategyStatus {
    Generated,
    Validated,
    Tested,
    Selected,
    Live,
    Retired,
    Failed,
}

impl StrategyStatus {
    /// `true` if `self` is a terminal state (Invariant 1: never returns to a queue state).
    pub fn is_terminal(self) -> bool {
        matches!(self, StrategyStatus::Retired | StrategyStatus::Failed)
    }

    /// Checks the pipeline DAG: `Generated -> Validated -> Tested -> Selected
    /// -> Live -> Retired`, plus `Failed` reachable from any non-terminal state.
    pub fn can_transition_to(self, next: StrategyStatus) -> bool {
        use StrategyStatus::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Generated, Validated)
                | (Validated, Tested)
                | (Tested, Selected)
                | (Selected, Live)
                | (Live, Retired)
                // Classifier may also bounce a Selected row back to Tested
                // when it loses its pool slot (§4.5 step 3/4 interplay).
                | (Selected, Tested)
                // Classifier's archival pass retires a Tested row that never
                // earned a pool slot, rather than leaving it queued forever
                // (§4.5 step 4).
                | (Tested, Retired)
        )
    }
}

/// The closed set of bar intervals a strategy may declare (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum BarInterval {
    #[serde(rename = "1m")]
    #[sqlx(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    #[sqlx(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    #[sqlx(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    #[sqlx(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    #[sqlx(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    #[sqlx(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    #[sqlx(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    #[sqlx(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    #[sqlx(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    #[sqlx(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    #[sqlx(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    #[sqlx(rename = "1d")]
    D1,
}

impl BarInterval {
    pub const ALL: [BarInterval; 12] = [
        BarInterval::M1,
        BarInterval::M3,
        BarInterval::M5,
        BarInterval::M15,
        BarInterval::M30,
        BarInterval::H1,
        BarInterval::H2,
        BarInterval::H4,
        BarInterval::H6,
        BarInterval::H8,
        BarInterval::H12,
        BarInterval::D1,
    ];

    /// Duration of one bar, used by the backtester/executor for bar-count math.
    pub fn seconds(self) -> i64 {
        match self {
            BarInterval::M1 => 60,
            BarInterval::M3 => 3 * 60,
            BarInterval::M5 => 5 * 60,
            BarInterval::M15 => 15 * 60,
            BarInterval::M30 => 30 * 60,
            BarInterval::H1 => 3_600,
            BarInterval::H2 => 2 * 3_600,
            BarInterval::H4 => 4 * 3_600,
            BarInterval::H6 => 6 * 3_600,
            BarInterval::H8 => 8 * 3_600,
            BarInterval::H12 => 12 * 3_600,
            BarInterval::D1 => 86_400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BarInterval::M1 => "1m",
            BarInterval::M3 => "3m",
            BarInterval::M5 => "5m",
            BarInterval::M15 => "15m",
            BarInterval::M30 => "30m",
            BarInterval::H1 => "1h",
            BarInterval::H2 => "2h",
            BarInterval::H4 => "4h",
            BarInterval::H6 => "6h",
            BarInterval::H8 => "8h",
            BarInterval::H12 => "12h",
            BarInterval::D1 => "1d",
        }
    }
}

/// A strategy's declared trade direction (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Bidi,
}

/// The primary pipeline artifact (§3 "Strategy").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Strategy {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub bar_interval: BarInterval,
    pub source: String,
    pub template_id: Option<Uuid>,
    pub params: Option<serde_json::Value>,
    pub base_code_hash: Option<String>,
    pub status: StrategyStatus,
    pub processing_by: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub tested_at: Option<DateTime<Utc>>,
    pub selected_at: Option<DateTime<Utc>>,
    pub live_at: Option<DateTime<Utc>>,
    pub retired_at: Option<DateTime<Utc>>,
    pub symbols: Vec<String>,
    pub optimal_bar_interval: Option<BarInterval>,
}

impl Strategy {
    /// Invariant 2: the lease is considered expired once `now` exceeds
    /// `processing_started_at + ttl`; both fields are set or unset together.
    pub fn lease_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        match self.processing_started_at {
            Some(started) => now > started + ttl,
            None => true,
        }
    }

    /// `true` when no worker currently holds (or no longer validly holds) this row.
    pub fn is_claimable(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.processing_by.is_none() || self.lease_expired(now, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_forward_edges_allowed() {
        assert!(StrategyStatus::Generated.can_transition_to(StrategyStatus::Validated));
        assert!(StrategyStatus::Validated.can_transition_to(StrategyStatus::Tested));
        assert!(StrategyStatus::Tested.can_transition_to(StrategyStatus::Selected));
        assert!(StrategyStatus::Selected.can_transition_to(StrategyStatus::Live));
        assert!(StrategyStatus::Live.can_transition_to(StrategyStatus::Retired));
    }

    #[test]
    fn failed_reachable_from_any_nonterminal() {
        for s in [
            StrategyStatus::Generated,
            StrategyStatus::Validated,
            StrategyStatus::Tested,
            StrategyStatus::Selected,
            StrategyStatus::Live,
        ] {
            assert!(s.can_transition_to(StrategyStatus::Failed));
        }
    }

    #[test]
    fn terminal_states_never_transition_back() {
        assert!(!StrategyStatus::Retired.can_transition_to(StrategyStatus::Generated));
        assert!(!StrategyStatus::Failed.can_transition_to(StrategyStatus::Generated));
        assert!(!StrategyStatus::Retired.can_transition_to(StrategyStatus::Live));
    }

    #[test]
    fn no_skipping_or_backward_edges() {
        assert!(!StrategyStatus::Generated.can_transition_to(StrategyStatus::Tested));
        assert!(!StrategyStatus::Live.can_transition_to(StrategyStatus::Generated));
        assert!(!StrategyStatus::Tested.can_transition_to(StrategyStatus::Generated));
    }

    #[test]
    fn classifier_may_bounce_selected_back_to_tested_or_retire_a_tested_row() {
        assert!(StrategyStatus::Selected.can_transition_to(StrategyStatus::Tested));
        assert!(StrategyStatus::Tested.can_transition_to(StrategyStatus::Retired));
        assert!(!StrategyStatus::Validated.can_transition_to(StrategyStatus::Retired));
    }
}

//! Recency weighting (§4.4 step 3): a strategy whose recent performance has
//! decayed relative to its full-history performance is penalised rather than
//! scored purely on the (possibly stale) full-history numbers.

/// `ratio = recent_sharpe / full_sharpe`. Returns `(scale, ratio)` where
/// `scale` is the multiplier applied to the full-period metrics to produce
/// the weighted ones: `1.0` once `ratio >= 1` (recent performance has not
/// decayed), otherwise `1 - min(max_penalty, 1 - ratio)`.
///
/// `full_sharpe == 0.0` is treated as `ratio = 0.0` (maximal decay) rather
/// than dividing by zero — a strategy with no full-history edge gets no
/// benefit of the doubt from a merely-non-negative recent sharpe.
pub fn recency_weight(full_sharpe: f64, recent_sharpe: f64, max_penalty: f64) -> (f64, f64) {
    let ratio = if full_sharpe.abs() > f64::EPSILON {
        recent_sharpe / full_sharpe
    } else {
        0.0
    };

    if ratio >= 1.0 {
        return (1.0, ratio);
    }

    let penalty = max_penalty.min(1.0 - ratio).max(0.0);
    (1.0 - penalty, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_at_or_above_one_applies_no_penalty() {
        let (scale, ratio) = recency_weight(1.0, 1.5, 0.5);
        assert_eq!(scale, 1.0);
        assert_eq!(ratio, 1.5);
    }

    #[test]
    fn decayed_recent_performance_scales_down_bounded_by_max_penalty() {
        let (scale, ratio) = recency_weight(2.0, 0.0, 0.5);
        assert_eq!(ratio, 0.0);
        // 1 - min(0.5, 1 - 0) = 1 - 0.5 = 0.5
        assert_eq!(scale, 0.5);
    }

    #[test]
    fn small_decay_applies_proportional_penalty_under_the_cap() {
        let (scale, ratio) = recency_weight(1.0, 0.9, 0.5);
        assert!((ratio - 0.9).abs() < 1e-9);
        // 1 - min(0.5, 0.1) = 0.9
        assert!((scale - 0.9).abs() < 1e-9);
    }

    #[test]
    fn zero_full_sharpe_is_treated_as_maximal_decay() {
        let (_, ratio) = recency_weight(0.0, 3.0, 0.5);
        assert_eq!(ratio, 0.0);
    }
}

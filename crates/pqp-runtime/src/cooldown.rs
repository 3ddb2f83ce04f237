use std::time::Duration;

/// Backpressure cool-down (§4.1/§8 boundary behaviours):
/// `clamp(base + k*(depth-limit), base, max)`. At `depth <= limit` the
/// cool-down is exactly `base`; it grows linearly past `limit` and
/// saturates at `max`.
pub fn cooldown(depth: u64, limit: u64, base: Duration, k: Duration, max: Duration) -> Duration {
    if depth <= limit {
        return base;
    }
    let over = depth - limit;
    let grown = base + k * over as u32;
    grown.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_depth_equal_limit_is_base() {
        let d = cooldown(100, 100, Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn below_limit_is_base() {
        let d = cooldown(50, 100, Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn grows_linearly_past_limit() {
        let d = cooldown(102, 100, Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn saturates_at_max() {
        // base=1s, k=2s, max=30s: reaches max once over >= ceil((30-1)/2) = 15.
        let d = cooldown(100 + 15, 100, Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(d, Duration::from_secs(30));
        let d2 = cooldown(100 + 1000, 100, Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(d2, Duration::from_secs(30));
    }
}

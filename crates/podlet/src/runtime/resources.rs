//! CPU resource translation into runtime units.

/// Minimum CPU shares a container may be given.
pub const MIN_SHARES: i64 = 2;
/// CPU shares corresponding to one full core.
pub const SHARES_PER_CPU: i64 = 1024;
/// Millicores per core.
pub const MILLI_CPU_TO_CPU: i64 = 1000;
/// CFS period in microseconds (100ms).
pub const QUOTA_PERIOD: i64 = 100_000;
/// Smallest CFS quota the kernel accepts, in microseconds.
pub const MIN_QUOTA_PERIOD: i64 = 1000;
/// Quota value meaning "no limit".
pub const UNLIMITED_QUOTA: i64 = -1;

/// Convert millicores to CPU shares, never below [`MIN_SHARES`].
#[must_use]
pub const fn milli_cpu_to_shares(milli_cpu: i64) -> i64 {
    if milli_cpu <= 0 {
        return MIN_SHARES;
    }
    let shares = milli_cpu.saturating_mul(SHARES_PER_CPU) / MILLI_CPU_TO_CPU;
    if shares < MIN_SHARES { MIN_SHARES } else { shares }
}

/// Convert a millicore limit to a CFS `(quota, period)` pair.
///
/// A zero limit yields [`UNLIMITED_QUOTA`]; a positive one is never below
/// [`MIN_QUOTA_PERIOD`].
#[must_use]
pub const fn milli_cpu_to_quota(milli_cpu: i64) -> (i64, i64) {
    if milli_cpu <= 0 {
        return (UNLIMITED_QUOTA, QUOTA_PERIOD);
    }
    let quota = milli_cpu.saturating_mul(QUOTA_PERIOD) / MILLI_CPU_TO_CPU;
    if quota < MIN_QUOTA_PERIOD {
        (MIN_QUOTA_PERIOD, QUOTA_PERIOD)
    } else {
        (quota, QUOTA_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shares_known_values() {
        assert_eq!(milli_cpu_to_shares(0), MIN_SHARES);
        assert_eq!(milli_cpu_to_shares(1), MIN_SHARES);
        assert_eq!(milli_cpu_to_shares(100), 102);
        assert_eq!(milli_cpu_to_shares(1000), 1024);
        assert_eq!(milli_cpu_to_shares(1500), 1536);
    }

    #[test]
    fn quota_known_values() {
        assert_eq!(milli_cpu_to_quota(0), (-1, 100_000));
        assert_eq!(milli_cpu_to_quota(5), (1000, 100_000));
        assert_eq!(milli_cpu_to_quota(250), (25_000, 100_000));
        assert_eq!(milli_cpu_to_quota(2000), (200_000, 100_000));
    }

    proptest! {
        #[test]
        fn shares_have_floor(milli in 0i64..100_000_000) {
            prop_assert!(milli_cpu_to_shares(milli) >= MIN_SHARES);
        }

        #[test]
        fn shares_are_monotonic(a in 0i64..10_000_000, b in 0i64..10_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(milli_cpu_to_shares(lo) <= milli_cpu_to_shares(hi));
        }

        #[test]
        fn quota_preserves_ratio(milli in 10i64..10_000_000) {
            let (quota, period) = milli_cpu_to_quota(milli);
            prop_assert!(quota > 0);
            prop_assert_eq!(period, QUOTA_PERIOD);
            prop_assert_eq!(quota * MILLI_CPU_TO_CPU / period, milli);
        }
    }
}

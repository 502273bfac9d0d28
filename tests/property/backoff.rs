//! Backoff delays follow min(base * 2^(n-1), max)

use proptest::prelude::*;
use sitequery::RetryPolicy;
use std::time::Duration;

proptest! {
    #[test]
    fn test_backoff_is_capped_exponential(
        base_ms in 0u64..5_000,
        max_ms in 0u64..60_000,
        attempts in 1u32..40,
    ) {
        let base = Duration::from_millis(base_ms);
        let max = Duration::from_millis(max_ms);
        let policy = RetryPolicy::new(attempts, base, max);

        let mut previous = Duration::ZERO;
        for n in 1..=attempts {
            let delay = policy.delay_for_attempt(n);
            let uncapped = base.checked_mul(1u32 << (n - 1).min(31)).unwrap_or(max);
            prop_assert_eq!(delay, uncapped.min(max));
            prop_assert!(delay <= max);
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }
}

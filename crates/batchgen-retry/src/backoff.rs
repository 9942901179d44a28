use std::time::Duration;

use crate::classify::ErrorClass;
use crate::jitter::JitterSource;

/// Base and cap for one error class's exponential backoff curve, in
/// seconds.
struct BackoffPolicy {
    base_secs: f64,
    max_secs: f64,
}

/// Provider rate limits reset on the order of minutes, so a rate-limited
/// attempt backs off far more aggressively than a plain server hiccup.
const RATE_LIMIT: BackoffPolicy = BackoffPolicy { base_secs: 60.0, max_secs: 3600.0 };
/// Hard quota exhaustion needs the longest runway: resets are often hourly.
const QUOTA: BackoffPolicy = BackoffPolicy { base_secs: 300.0, max_secs: 3600.0 };
/// Transient server/network failures are expected to clear up in seconds.
const TRANSIENT: BackoffPolicy = BackoffPolicy { base_secs: 0.5, max_secs: 4.0 };

const MIN_DELAY_SECS: f64 = 0.1;
const JITTER_FRACTION: f64 = 0.25;

fn policy_for(class: ErrorClass) -> &'static BackoffPolicy {
    match class {
        ErrorClass::RateLimit => &RATE_LIMIT,
        ErrorClass::Quota => &QUOTA,
        ErrorClass::Server | ErrorClass::Network => &TRANSIENT,
        ErrorClass::Permanent => &TRANSIENT,
    }
}

/// Whether `retry_after` should be honored on every attempt for this class,
/// rather than only the first. Server hiccups carry a fresh `Retry-After`
/// worth trusting each time; rate-limit and quota hints are only trusted on
/// the attempt that produced them, falling back to the exponential curve
/// afterwards.
fn honors_retry_after_on_every_attempt(class: ErrorClass) -> bool {
    matches!(class, ErrorClass::Server)
}

/// Computes the delay to wait before the next attempt.
///
/// `attempt` is 0-based (the attempt that just failed). When a provider
/// supplies `retry_after`, that hint is used verbatim and no jitter is
/// applied — the provider told us exactly how long to wait. For
/// `rate_limit`/`quota` this hint is only honored on the first attempt;
/// `server` honors it on every attempt. Otherwise the delay follows
/// `base * 2^attempt`, capped at the class's maximum, with up to ±25%
/// jitter.
pub fn compute_backoff(
    attempt: u32,
    class: ErrorClass,
    retry_after: Option<Duration>,
    jitter: &dyn JitterSource,
) -> Duration {
    if attempt == 0 || honors_retry_after_on_every_attempt(class) {
        if let Some(hint) = retry_after {
            return hint;
        }
    }

    let policy = policy_for(class);
    let delay = (policy.base_secs * 2f64.powi(attempt as i32)).min(policy.max_secs);
    let jitter_factor = 2.0 * jitter.next_f64() - 1.0;
    let jittered = delay + delay * JITTER_FRACTION * jitter_factor;
    Duration::from_secs_f64(jittered.max(MIN_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::FixedJitter;

    #[test]
    fn rate_limit_uses_retry_after_on_first_attempt() {
        let jitter = FixedJitter::new(0.5);
        let delay = compute_backoff(0, ErrorClass::RateLimit, Some(Duration::from_secs(11)), &jitter);
        assert_eq!(delay, Duration::from_secs(11));
    }

    #[test]
    fn rate_limit_falls_back_to_exponential_after_first_attempt() {
        let jitter = FixedJitter::new(0.5);
        let delay = compute_backoff(1, ErrorClass::RateLimit, Some(Duration::from_secs(5)), &jitter);
        assert_eq!(delay, Duration::from_secs(120));
    }

    #[test]
    fn quota_backoff_curve_matches_reference_table() {
        let jitter = FixedJitter::new(0.5);
        let expected = [300.0, 600.0, 1200.0, 2400.0, 3600.0];
        for (attempt, expected_secs) in expected.iter().enumerate() {
            let delay = compute_backoff(attempt as u32, ErrorClass::Quota, None, &jitter);
            assert!((delay.as_secs_f64() - expected_secs).abs() < 1e-6);
        }
    }

    #[test]
    fn server_honors_retry_after_on_every_attempt() {
        let jitter = FixedJitter::new(0.5);
        let delay = compute_backoff(2, ErrorClass::Server, Some(Duration::from_secs(7)), &jitter);
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[test]
    fn midpoint_jitter_source_produces_zero_jitter() {
        let jitter = FixedJitter::new(0.5);
        let delay = compute_backoff(0, ErrorClass::Server, None, &jitter);
        assert!((delay.as_secs_f64() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn delay_never_drops_below_minimum() {
        let jitter = FixedJitter::new(0.0);
        let delay = compute_backoff(0, ErrorClass::Server, None, &jitter);
        assert!(delay.as_secs_f64() >= MIN_DELAY_SECS - 1e-9);
    }
}

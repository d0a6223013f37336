//! Tests for `RetryPolicy`.

use super::policy::{Failure, FailureClass, RetryDecision, RetryPolicy};
use super::{parse_retry_after, parse_should_retry};
use http::StatusCode;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

mod retry_policy_defaults {
    use super::*;

    #[test]
    fn new_creates_policy_with_defaults() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
        assert_eq!(policy.max_retry_after, Duration::from_secs(60));
    }

    #[test]
    fn default_trait_matches_new() {
        assert_eq!(RetryPolicy::new(), RetryPolicy::default());
    }

    #[test]
    fn max_attempts_counts_first_attempt() {
        assert_eq!(RetryPolicy::new().max_attempts(), 3);
        assert_eq!(RetryPolicy::new().with_max_retries(0).max_attempts(), 1);
    }
}

mod retry_policy_builder {
    use super::*;

    #[test]
    fn builder_methods_set_values() {
        let policy = RetryPolicy::new()
            .with_max_retries(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(10))
            .with_max_retry_after(Duration::from_secs(30));

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
        assert_eq!(policy.max_retry_after, Duration::from_secs(30));
    }
}

mod backoff {
    use super::*;

    #[test]
    fn ceiling_doubles_until_capped() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.backoff_ceiling(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_ceiling(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_secs(2));
    }

    #[test]
    fn ceiling_does_not_overflow_on_large_retry_numbers() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.backoff_ceiling(40), policy.max_delay);
        assert_eq!(policy.backoff_ceiling(u32::MAX), policy.max_delay);
    }

    #[test]
    fn jittered_delay_stays_below_ceiling() {
        let policy = RetryPolicy::new();
        let mut rng = rng();

        for retry in 0..6 {
            let ceiling = policy.backoff_ceiling(retry);
            for _ in 0..200 {
                let delay = policy.backoff_delay(retry, &mut rng);
                assert!(delay < ceiling, "retry {retry}: {delay:?} >= {ceiling:?}");
            }
        }
    }

    #[test]
    fn jitter_spreads_delays() {
        let policy = RetryPolicy::new();
        let mut rng = rng();

        let delays: Vec<_> = (0..50).map(|_| policy.backoff_delay(2, &mut rng)).collect();
        let first = delays[0];

        assert!(delays.iter().any(|d| *d != first));
    }

    #[test]
    fn zero_ceiling_yields_zero_delay() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO);

        assert_eq!(policy.backoff_delay(0, &mut rng()), Duration::ZERO);
    }
}

mod retryable {
    use super::*;

    #[test]
    fn transport_failures_are_retried() {
        assert!(RetryPolicy::new().is_retryable(&Failure::transport(), false));
    }

    #[test]
    fn server_errors_and_rate_limits_are_retried() {
        let policy = RetryPolicy::new();

        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            assert!(policy.is_retryable(&Failure::status(status), false), "{status}");
        }
    }

    #[test]
    fn client_errors_are_terminal() {
        let policy = RetryPolicy::new();

        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::PAYMENT_REQUIRED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            assert!(!policy.is_retryable(&Failure::status(status), true), "{status}");
        }
    }

    #[test]
    fn conflict_requires_idempotency_key() {
        let policy = RetryPolicy::new();
        let failure = Failure::status(StatusCode::CONFLICT);

        assert!(policy.is_retryable(&failure, true));
        assert!(!policy.is_retryable(&failure, false));
    }

    #[test]
    fn server_hint_overrides_status_rule() {
        let policy = RetryPolicy::new();

        let forced = Failure::status(StatusCode::BAD_REQUEST).with_should_retry(true);
        assert!(policy.is_retryable(&forced, false));

        let suppressed = Failure::status(StatusCode::SERVICE_UNAVAILABLE).with_should_retry(false);
        assert!(!policy.is_retryable(&suppressed, false));
    }
}

mod decide {
    use super::*;

    #[test]
    fn bad_request_stops_immediately() {
        let decision = RetryPolicy::new().decide(
            0,
            &Failure::status(StatusCode::BAD_REQUEST),
            true,
            &mut rng(),
        );

        assert_eq!(decision, RetryDecision::Stop);
    }

    #[test]
    fn attempts_never_exceed_budget() {
        let policy = RetryPolicy::new().with_max_retries(3);
        let failure = Failure::transport();
        let mut rng = rng();

        let mut attempts = 1;
        let mut retries_done = 0;
        while let RetryDecision::Retry { .. } = policy.decide(retries_done, &failure, true, &mut rng)
        {
            retries_done += 1;
            attempts += 1;
        }

        assert_eq!(attempts, policy.max_attempts());
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy::new().with_max_retries(0);

        assert_eq!(
            policy.decide(0, &Failure::transport(), true, &mut rng()),
            RetryDecision::Stop
        );
    }

    #[test]
    fn retry_after_is_a_floor() {
        let policy = RetryPolicy::new();
        let failure =
            Failure::status(StatusCode::TOO_MANY_REQUESTS).with_retry_after(Duration::from_secs(5));

        match policy.decide(0, &failure, false, &mut rng()) {
            RetryDecision::Retry { delay } => assert!(delay >= Duration::from_secs(5)),
            RetryDecision::Stop => panic!("429 should be retried"),
        }
    }

    #[test]
    fn oversized_retry_after_stops() {
        let policy = RetryPolicy::new();
        let failure = Failure::status(StatusCode::SERVICE_UNAVAILABLE)
            .with_retry_after(Duration::from_secs(3600));

        assert_eq!(
            policy.decide(0, &failure, false, &mut rng()),
            RetryDecision::Stop
        );
    }

    #[test]
    fn retry_after_at_cap_is_waited_for() {
        let policy = RetryPolicy::new();
        let failure = Failure::status(StatusCode::TOO_MANY_REQUESTS)
            .with_retry_after(policy.max_retry_after);

        assert_eq!(
            policy.decide(0, &failure, false, &mut rng()),
            RetryDecision::Retry {
                delay: policy.max_retry_after
            }
        );
    }

    #[test]
    fn failure_class_is_preserved() {
        let failure = Failure::status(StatusCode::CONFLICT);
        assert_eq!(failure.class, FailureClass::Status(StatusCode::CONFLICT));
    }
}

mod header_parsing {
    use super::*;

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
    }

    #[test]
    fn retry_after_rejects_dates_and_garbage() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn should_retry_values() {
        assert_eq!(parse_should_retry("true"), Some(true));
        assert_eq!(parse_should_retry("false"), Some(false));
        assert_eq!(parse_should_retry("maybe"), None);
    }
}

//! Retry loop with exponential backoff.
//!
//! Each attempt is classified by the caller as done, retryable or fatal. The
//! loop owns the attempt counter, the backoff schedule and the logging.

use std::time::Duration;

use tracing::{error, warn};

use crate::error::{SeriesError, TransientFailure};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before 0-indexed attempt `attempt`: `base * 2^(attempt-1)`, zero for the first.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(31);
        self.base_delay.saturating_mul(factor)
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

// Lets tests keep ownership of a recording sleeper and inspect it afterwards.
impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) {
        (**self).sleep(delay);
    }
}

/// Classification of one attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Retry(TransientFailure),
    Abort(SeriesError),
}

/// Run `attempt` until it is done, aborts, or the policy is exhausted.
///
/// `attempt` receives the 0-indexed attempt number. `label` identifies the
/// request in log lines.
pub fn run<T, S, F>(policy: &RetryPolicy, sleeper: &S, label: &str, mut attempt: F) -> Result<T, SeriesError>
where
    S: Sleeper + ?Sized,
    F: FnMut(u32) -> Attempt<T>,
{
    // A policy of zero attempts would never call the upstream at all; always try once.
    let max_attempts = policy.max_attempts.max(1);
    let mut made = 0u32;

    loop {
        let failure = match attempt(made) {
            Attempt::Done(value) => return Ok(value),
            Attempt::Abort(err) => return Err(err),
            Attempt::Retry(failure) => failure,
        };
        made += 1;

        if made >= max_attempts {
            error!(series = label, attempts = made, "EIA request failed after {made} attempts: {failure}");
            return Err(SeriesError::RetryableTransport {
                attempts: made,
                failure,
            });
        }

        // `made` attempts have failed, so the next one is attempt number `made`
        // (0-indexed): 1s before the second, 2s before the third.
        let delay = policy.delay_before(made);
        warn!(
            series = label,
            attempt = made,
            "{failure} (attempt {made}/{max_attempts}), retrying in {}s",
            delay.as_secs_f64()
        );
        sleeper.sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Duration>>);

    impl Sleeper for Recorder {
        fn sleep(&self, delay: Duration) {
            self.0.borrow_mut().push(delay);
        }
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(0), Duration::ZERO);
        assert_eq!(policy.delay_before(1), Duration::from_secs(1));
        assert_eq!(policy.delay_before(2), Duration::from_secs(2));
        assert_eq!(policy.delay_before(3), Duration::from_secs(4));
    }

    #[test]
    fn abort_stops_immediately() {
        let sleeper = Recorder::default();
        let mut calls = 0;
        let out: Result<(), _> = run(&RetryPolicy::default(), &sleeper, "t", |_| {
            calls += 1;
            Attempt::Abort(SeriesError::UnknownSeries("x".into()))
        });
        assert!(matches!(out, Err(SeriesError::UnknownSeries(_))));
        assert_eq!(calls, 1);
        assert!(sleeper.0.borrow().is_empty());
    }

    #[test]
    fn exhaustion_reports_last_failure() {
        let sleeper = Recorder::default();
        let mut seen = Vec::new();
        let out: Result<(), _> = run(&RetryPolicy::default(), &sleeper, "t", |n| {
            seen.push(n);
            Attempt::Retry(TransientFailure::Connection(format!("refused #{n}")))
        });

        assert_eq!(seen, vec![0, 1, 2]);
        match out {
            Err(SeriesError::RetryableTransport { attempts, failure }) => {
                assert_eq!(attempts, 3);
                assert_eq!(failure, TransientFailure::Connection("refused #2".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            *sleeper.0.borrow(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn zero_attempt_policy_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::from_millis(1),
        };
        let mut calls = 0;
        let out = run(&policy, &ThreadSleeper, "t", |_| {
            calls += 1;
            Attempt::Done(7)
        });
        assert_eq!(out, Ok(7));
        assert_eq!(calls, 1);
    }
}

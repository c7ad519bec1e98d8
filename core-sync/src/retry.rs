//! # Retry Loops
//!
//! Fixed-delay retry for cover uploads and bounded polling for cover
//! visibility. Both wait through an injected [`Sleeper`] so tests run without
//! real delays.

use std::future::Future;
use std::time::Duration;

use bridge_traits::time::Sleeper;
use tracing::debug;

/// Fixed-delay retry policy
///
/// `max_attempts: None` retries until the operation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between consecutive attempts
    pub delay: Duration,
    /// Total attempts including the first; `None` for no cap
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub const fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub const fn capped(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted
///
/// `on_failure` sees every failed attempt number and its error. Returning
/// `false` stops retrying immediately. The final error is returned together
/// with the number of attempts made.
pub async fn retry_with<T, E, F, Fut, N>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
    mut on_failure: N,
) -> Result<T, (E, u32)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(u32, &E) -> bool,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !policy.allows_retry_after(attempt) || !on_failure(attempt, &error) {
                    return Err((error, attempt));
                }
                sleeper.sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// Poll `check` until it yields a value, at most `attempts` times
///
/// Waits `delay` after every unsuccessful check, including the last, matching
/// a loop that sleeps before re-checking its condition.
pub async fn poll_until<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    sleeper: &dyn Sleeper,
    mut check: F,
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=attempts {
        if let Some(value) = check(attempt).await {
            return Some(value);
        }
        debug!(attempt, attempts, "Poll condition not met");
        sleeper.sleep(delay).await;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_unbounded_retries_until_success() {
        let sleeper = RecordingSleeper::default();
        let mut retried = Vec::new();

        let result: Result<u32, (String, u32)> = retry_with(
            RetryPolicy::unbounded(DELAY),
            &sleeper,
            |attempt| async move {
                if attempt < 7 {
                    Err(format!("attempt {attempt} failed"))
                } else {
                    Ok(attempt)
                }
            },
            |attempt, _| {
                retried.push(attempt);
                true
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(retried, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(sleeper.waits(), vec![DELAY; 6]);
    }

    #[tokio::test]
    async fn test_capped_policy_returns_last_error() {
        let sleeper = RecordingSleeper::default();

        let result: Result<(), (String, u32)> = retry_with(
            RetryPolicy::capped(DELAY, 3),
            &sleeper,
            |attempt| async move { Err(format!("attempt {attempt} failed")) },
            |_, _| true,
        )
        .await;

        assert_eq!(result.unwrap_err(), ("attempt 3 failed".to_string(), 3));
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_first_success_never_sleeps() {
        let sleeper = RecordingSleeper::default();
        let result: Result<&str, (String, u32)> = retry_with(
            RetryPolicy::capped(DELAY, 1),
            &sleeper,
            |_| async { Ok("done") },
            |_, _| true,
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_on_failure_can_stop_unbounded_retry() {
        let sleeper = RecordingSleeper::default();

        let result: Result<(), (&str, u32)> = retry_with(
            RetryPolicy::unbounded(DELAY),
            &sleeper,
            |attempt| async move {
                if attempt == 2 {
                    Err("fatal")
                } else {
                    Err("transient")
                }
            },
            |_, error| *error != "fatal",
        )
        .await;

        assert_eq!(result.unwrap_err(), ("fatal", 2));
        assert_eq!(sleeper.waits().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_until_found() {
        let sleeper = RecordingSleeper::default();
        let found = poll_until(5, DELAY, &sleeper, |attempt| async move {
            (attempt == 3).then_some("cover")
        })
        .await;

        assert_eq!(found, Some("cover"));
        assert_eq!(sleeper.waits(), vec![DELAY; 2]);
    }

    #[tokio::test]
    async fn test_poll_until_gives_up() {
        let sleeper = RecordingSleeper::default();
        let found: Option<()> = poll_until(5, DELAY, &sleeper, |_| async { None }).await;

        assert_eq!(found, None);
        assert_eq!(sleeper.waits(), vec![DELAY; 5]);
    }

    #[test]
    fn test_policy_limits() {
        assert!(RetryPolicy::unbounded(DELAY).allows_retry_after(u32::MAX - 1));
        assert!(RetryPolicy::capped(DELAY, 2).allows_retry_after(1));
        assert!(!RetryPolicy::capped(DELAY, 2).allows_retry_after(2));
    }
}

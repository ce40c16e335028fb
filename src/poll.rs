//! Bounded retry poller.
//!
//! Repeats a single-shot status fetch until it reports a terminal status or
//! the attempt budget runs out. Failed fetches and non-terminal statuses are
//! both retried. Only the final attempt is reported on exhaustion; earlier
//! attempts are discarded.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::client::HasStatus;
use crate::errors::{ClientError, LastAttempt, PollExhausted};

/// Attempt budget and exponential backoff for one kind of status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Build status.
    pub const BUILD: RetryPolicy = RetryPolicy {
        max_attempts: 11,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(2),
    };

    /// Test run status.
    pub const RUN: RetryPolicy = RetryPolicy {
        max_attempts: 5,
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(2),
    };

    /// Wait after the attempt with 0-based index `attempt` fails.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Total time spent waiting when the first `attempts` attempts all fail
    /// and another attempt follows each of them.
    pub fn total_wait(&self, attempts: u32) -> Duration {
        (0..attempts).map(|attempt| self.delay_after(attempt)).sum()
    }

    /// Attempt budget, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Poll `fetch` until it returns a terminal status.
///
/// On success the returned value's status is `Success` or `Failure`. On
/// exhaustion the error holds only the last attempt's failure or status.
pub async fn poll_until_terminal<T, F, Fut>(
    policy: &RetryPolicy,
    mut fetch: F,
) -> Result<T, PollExhausted>
where
    T: HasStatus,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let budget = policy.attempts();
    let mut attempt = 0;

    loop {
        let last = match fetch().await {
            Ok(value) if value.status().is_terminal() => {
                debug!(subject = T::SUBJECT, attempt = attempt + 1, status = %value.status(), "terminal status");
                return Ok(value);
            }
            Ok(value) => LastAttempt::NotTerminal {
                subject: T::SUBJECT,
                status: value.status().to_string(),
            },
            Err(err) => LastAttempt::Failed(err),
        };
        attempt += 1;

        if attempt >= budget {
            return Err(PollExhausted {
                attempts: attempt,
                last,
            });
        }

        let delay = policy.delay_after(attempt - 1);
        debug!(
            subject = T::SUBJECT,
            attempt,
            budget,
            delay_ms = delay.as_millis() as u64,
            reason = %last,
            "retrying status fetch"
        );
        drop(last);
        tokio::time::sleep(delay).await;
    }
}

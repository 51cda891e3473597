use std::future::Future;
use std::time::Duration;

/// Bounded exponential-backoff executor wrapping a fallible async operation.
///
/// Applied only around the upstream offer fetch; token refresh fails fast
/// instead, since a rejected credential is not a transient condition.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_wait: Duration,
    pub max_wait: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_wait: Duration::from_millis(1000),
            max_wait: Duration::from_millis(10_000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (zero-based), doubling from
    /// `initial_wait` and capped at `max_wait`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_wait.saturating_mul(factor).min(self.max_wait)
    }

    /// Runs `operation` up to `max_attempts` times, sleeping the computed
    /// backoff between attempts. Errors for which `retryable` returns false
    /// surface immediately; once the budget is exhausted the last failure is
    /// returned unchanged.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        retryable: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && retryable(&err) => {
                    let wait = self.backoff(attempt - 1);
                    tracing::warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        err,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

//! Bounded retry with linear backoff, shared by every provider client.
//!
//! Providers classify each response into an [`Attempt`]; the policy
//! decides whether to sleep and go again. Transient failures back off
//! linearly (`backoff_base × attempt_number`); an explicit rate-limit
//! signal sleeps a fixed duration instead. Permanent failures stop the
//! loop immediately.

use std::future::Future;
use std::time::Duration;

/// Classification of a single provider request.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    /// Usable response.
    Ok(T),
    /// Timeout, connection error or 5xx; worth retrying.
    Transient(String),
    /// Explicit rate-limit signal from the provider.
    RateLimited,
    /// Bad request or malformed payload; retrying cannot help.
    Permanent(String),
}

/// What the retry loop ultimately produced.
#[derive(Debug)]
pub(crate) enum RetryOutcome<T> {
    Ok(T),
    /// Retries exhausted on transient failures.
    Transient(String),
    Permanent(String),
}

/// Retry schedule for one provider.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Linear backoff unit: sleep `backoff_base × attempt_number` after a
    /// transient failure.
    pub backoff_base: Duration,
    /// Fixed sleep after a rate-limit signal.
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub(crate) async fn run<T, F, Fut>(&self, source: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            match op().await {
                Attempt::Ok(value) => return RetryOutcome::Ok(value),
                Attempt::Permanent(reason) => {
                    tracing::warn!(source, %reason, "permanent failure, not retrying");
                    return RetryOutcome::Permanent(reason);
                }
                Attempt::RateLimited => {
                    tracing::warn!(source, attempt, "provider rate limit hit");
                    last_reason = "rate limited".to_string();
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.rate_limit_backoff).await;
                    }
                }
                Attempt::Transient(reason) => {
                    tracing::warn!(source, attempt, %reason, "transient failure");
                    last_reason = reason;
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff_base * attempt).await;
                    }
                }
            }
        }

        RetryOutcome::Transient(last_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
            rate_limit_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let mut calls = 0u32;
        let outcome = fast_policy()
            .run("test", || {
                calls += 1;
                let this_call = calls;
                async move {
                    if this_call < 3 {
                        Attempt::Transient("boom".to_string())
                    } else {
                        Attempt::Ok(42)
                    }
                }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Ok(42)));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_stops_immediately() {
        let mut calls = 0u32;
        let outcome: RetryOutcome<()> = fast_policy()
            .run("test", || {
                calls += 1;
                async { Attempt::Permanent("bad request".to_string()) }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Permanent(r) if r == "bad request"));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_exhausted_transient_failures() {
        let mut calls = 0u32;
        let outcome: RetryOutcome<()> = fast_policy()
            .run("test", || {
                calls += 1;
                async { Attempt::Transient("timeout".to_string()) }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Transient(r) if r == "timeout"));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_rate_limit_consumes_attempts() {
        let mut calls = 0u32;
        let outcome: RetryOutcome<()> = fast_policy()
            .run("test", || {
                calls += 1;
                async { Attempt::RateLimited }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Transient(r) if r == "rate limited"));
        assert_eq!(calls, 3);
    }
}

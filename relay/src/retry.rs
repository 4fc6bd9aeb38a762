//! Bounded "wait until ready" polling used by every startup wait.

use crate::constants::wait;
use crate::error::{RelayError, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed,
    Exponential { factor: u32, max_delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, delay: Duration, factor: u32, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Exponential { factor, max_delay },
        }
    }

    pub fn upstream_health() -> Self {
        Self::fixed(
            wait::UPSTREAM_ATTEMPTS,
            Duration::from_secs(wait::UPSTREAM_DELAY_SECS),
        )
    }

    pub fn postgres() -> Self {
        Self::fixed(
            wait::POSTGRES_ATTEMPTS,
            Duration::from_secs(wait::POSTGRES_DELAY_SECS),
        )
    }

    pub fn schema() -> Self {
        Self::fixed(
            wait::SCHEMA_ATTEMPTS,
            Duration::from_secs(wait::SCHEMA_DELAY_SECS),
        )
    }

    pub fn role_table() -> Self {
        Self::fixed(
            wait::ROLE_TABLE_ATTEMPTS,
            Duration::from_secs(wait::ROLE_TABLE_DELAY_SECS),
        )
    }

    /// Sleep before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let exp = attempt.saturating_sub(1).min(16);
                let mult = factor.max(1).saturating_pow(exp);
                self.delay.saturating_mul(mult).min(max_delay)
            }
        }
    }
}

/// Polls `check` until it reports ready, returning the attempt that succeeded.
///
/// `Ok(false)` and `Err(_)` both count as "not yet". There is no sleep after the last
/// attempt; exhaustion yields `RelayError::RetriesExhausted` with the last failure.
pub async fn wait_until<F, Fut, E>(policy: RetryPolicy, label: &str, mut check: F) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<bool, E>>,
    E: Display,
{
    let mut last_error = String::from("not ready");

    for attempt in 1..=policy.max_attempts {
        match check().await {
            Ok(true) => {
                tracing::info!(attempt, "{} is ready", label);
                return Ok(attempt);
            }
            Ok(false) => last_error = String::from("not ready"),
            Err(e) => last_error = e.to_string(),
        }

        if attempt < policy.max_attempts {
            tracing::info!(
                "Waiting for {}... ({}/{}): {}",
                label,
                attempt,
                policy.max_attempts,
                last_error
            );
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    Err(RelayError::RetriesExhausted {
        label: label.to_string(),
        attempts: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let attempt = wait_until(quick(10), "service", move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, String>(n == 3)
            }
        })
        .await
        .unwrap();

        assert_eq!(attempt, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = wait_until(quick(4), "postgres", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<bool, _>("connection refused")
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match err {
            RelayError::RetriesExhausted {
                label,
                attempts,
                last_error,
            } => {
                assert_eq!(label, "postgres");
                assert_eq!(attempts, 4);
                assert_eq!(last_error, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn presets_match_startup_budget() {
        let p = RetryPolicy::upstream_health();
        assert_eq!(p.max_attempts, 30);
        assert_eq!(p.delay_after(7), Duration::from_secs(2));
        assert_eq!(RetryPolicy::schema().max_attempts, 40);
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let p = RetryPolicy::exponential(
            10,
            Duration::from_millis(100),
            2,
            Duration::from_millis(500),
        );
        assert_eq!(p.delay_after(1), Duration::from_millis(100));
        assert_eq!(p.delay_after(2), Duration::from_millis(200));
        assert_eq!(p.delay_after(3), Duration::from_millis(400));
        assert_eq!(p.delay_after(4), Duration::from_millis(500));
        assert_eq!(p.delay_after(30), Duration::from_millis(500));
    }

    #[test]
    fn zero_attempts_still_checks_once() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts, 1);
    }
}

//! Bounded retry with exponential backoff

use folio_errors::{Error, NetworkError};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry policy: attempt count ceiling and the first backoff wait.
///
/// Backoff doubles per retry: with the defaults the waits are 1s then 2s.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    fn backoff_before(&self, attempt: u32) -> Duration {
        // attempt is 1-based here; wait 2^(n-1) * initial before retry n.
        self.initial_backoff * 2u32.saturating_pow(attempt - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&folio_config::CloudConfig> for RetryPolicy {
    fn from(config: &folio_config::CloudConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.initial_backoff_secs),
        )
    }
}

/// Run `op` until it succeeds, fails fatally, or exhausts the policy.
///
/// The closure receives the zero-based attempt index. Fatal errors (per
/// `Error::is_retryable`) return immediately; retryable ones wait out the
/// backoff, aborting promptly if `cancel` fires during the wait.
///
/// # Errors
///
/// The fatal error itself, `Error::Cancelled`, or
/// `NetworkError::RetriesExhausted` wrapping the last retryable failure.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut last: Option<Error> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let backoff = policy.backoff_before(attempt);
            tracing::warn!(
                attempt,
                max = policy.max_attempts,
                "retrying in {backoff:?} after: {}",
                last.as_ref().map_or_else(String::new, ToString::to_string)
            );
            tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(backoff) => {}
            }
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => last = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(NetworkError::RetriesExhausted {
        attempts: policy.max_attempts,
        last: last.map_or_else(String::new, |e| e.to_string()),
    }
    .into())
}

use log::{debug, error};
use tokio::time::Duration;

use crate::error::RpcError;

const MAX_RETRIES: u32 = 4;
const INITIAL_BACKOFF: u64 = 500;
const TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds applied to a single RPC call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF),
            timeout: TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the given timeout.
    pub fn once(timeout: Duration) -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::ZERO,
            timeout,
        }
    }
}

/// Retries an asynchronous call with exponential backoff.
///
/// Only transient failures (transport errors, timeouts, 5xx and 429) are
/// retried; anything else is returned immediately.
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, label: &str, f: F) -> Result<T, RpcError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, RpcError>>,
{
    let attempts = policy.attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match tokio::time::timeout(policy.timeout, f()).await {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(e)) => e,
            Err(_) => RpcError::Timeout(label.to_string(), policy.timeout),
        };

        if !err.is_transient() {
            return Err(err);
        }

        if attempt >= attempts {
            error!("Attempt {} for {} failed: {}", attempt, label, err);
            return Err(err);
        }

        error!("Attempt {} for {} failed, retrying after backoff", attempt, label);
        debug!("Waiting for backoff: {:?}", backoff);

        tokio::time::sleep(backoff).await;
        backoff *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_backoff: Duration::ZERO,
            timeout: Duration::from_secs(1),
        }
    }

    fn transient() -> RpcError {
        RpcError::Status { url: "http://node".into(), status: 503 }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);

        let result = retry(&fast(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7u64)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let calls = AtomicU32::new(0);

        let result: Result<u64, _> = retry(&fast(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;

        assert!(matches!(result, Err(RpcError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_errors() {
        let calls = AtomicU32::new(0);

        let result: Result<u64, _> = retry(&fast(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RpcError::LookBackExceeded { height: 10, limit: 5 })
        })
        .await;

        assert!(result.unwrap_err().is_look_back());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

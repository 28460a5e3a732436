//! Database retry logic for transient failures
//!
//! Provides automatic retry with exponential backoff for repository operations.

use crate::error::RepositoryResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 2_000;

/// Execute a repository operation, retrying transient failures.
///
/// Non-transient errors (see [`crate::error::RepositoryError::is_transient`])
/// are returned immediately.
///
/// # Example
/// ```ignore
/// let factors = execute_with_retry("load factors", 3, move || async move {
///     let rows = sqlx::query("SELECT * FROM factors").fetch_all(pool).await?;
///     Ok(rows)
/// })
/// .await?;
/// ```
pub async fn execute_with_retry<F, Fut, T>(
    operation: &str,
    max_attempts: u32,
    mut f: F,
) -> RepositoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RepositoryResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && e.is_transient() => {
                let backoff_ms = backoff_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    operation, attempt, max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_for(attempt: u32) -> u64 {
    (BASE_BACKOFF_MS * 2_u64.pow(attempt.saturating_sub(1).min(16))).min(MAX_BACKOFF_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(backoff_for(1), 100);
        assert_eq!(backoff_for(2), 200);
        assert_eq!(backoff_for(3), 400);
        assert_eq!(backoff_for(10), MAX_BACKOFF_MS);
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result = execute_with_retry("test op", 3, || {
            let count = attempt_count_clone.clone();
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                if current < 3 {
                    Err(RepositoryError::Unavailable("connection timeout".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result: RepositoryResult<i32> = execute_with_retry("test op", 3, || {
            let count = attempt_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(RepositoryError::Unavailable("connection timeout".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_decode_error() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result: RepositoryResult<i32> = execute_with_retry("test op", 3, || {
            let count = attempt_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(RepositoryError::Decode("bad reasons column".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1); // Should not retry
    }
}

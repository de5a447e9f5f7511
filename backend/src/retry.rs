use std::future::Future;
use std::time::Duration;

/// Run `task`, retrying up to `max_retries` more times on `Err` with
/// pure exponential backoff (`base_delay * 2^attempt`, no jitter).
/// The last error is returned once the budget is exhausted.
///
/// Callers decide what counts as retryable: a task should return `Err`
/// only for transient conditions and fold non-retryable failures into
/// its `Ok` value so they bypass the loop.
pub async fn with_retry<T, E, F, Fut>(
    mut task: F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match task().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_retries {
                    return Err(err);
                }
                let wait = base_delay * 2u32.pow(attempt);
                tracing::debug!(
                    "attempt {} of {} failed, retrying in {wait:?}",
                    attempt + 1,
                    max_retries + 1
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_on_first_attempt_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n) }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok("done")
                    }
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), u32> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(n) }
            },
            2,
            Duration::from_millis(1),
        )
        .await;
        // two retries means three attempts, and the error is the last one
        assert_eq!(result, Err(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("nope") }
            },
            0,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

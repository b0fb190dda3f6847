//! Bounded retry with exponential backoff and jitter

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{ClassifiedError, ErrorKind};

/// How an attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retry<E> {
    /// Worth trying again
    Transient(E),
    /// Give up immediately
    Permanent(E),
}

impl<E> Retry<E> {
    pub fn into_inner(self) -> E {
        match self {
            Retry::Transient(e) | Retry::Permanent(e) => e,
        }
    }
}

impl Retry<ClassifiedError> {
    /// Throttling and unclassifiable failures are transient, everything else is not
    pub fn from_classified(err: ClassifiedError) -> Self {
        match err.kind {
            ErrorKind::LimitExceeded | ErrorKind::InternalError => Retry::Transient(err),
            _ => Retry::Permanent(err),
        }
    }
}

/// Run `operation` up to `max_attempts` times.
///
/// After a transient failure the call sleeps `delay + random(0..=delay/2)` and doubles
/// `delay`. A permanent failure is returned without further attempts; exhausting the
/// attempts returns the last error. `max_attempts == 0` behaves like 1.
pub async fn retry<T, E, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Retry<E>>>,
{
    let mut remaining = max_attempts.max(1);
    let mut delay = initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(Retry::Permanent(err)) => return Err(err),
            Err(Retry::Transient(err)) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(err);
                }

                let pause = delay + jitter(delay);
                tracing::debug!(
                    "Transient failure, retrying in {:?} ({} attempt(s) left)",
                    pause,
                    remaining
                );
                tokio::time::sleep(pause).await;
                delay = delay.saturating_mul(2);
            }
        }
    }
}

/// Uniform random duration in `0..=delay/2`
pub fn jitter(delay: Duration) -> Duration {
    let bound = (delay / 2).as_millis() as u64;
    if bound == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_runs_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), String> = retry(4, Duration::from_millis(100), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Retry::Transient(format!("attempt {}", n)))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result, Err("attempt 4".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_after_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), &str> = retry(5, Duration::from_secs(1), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Retry::Permanent("bad input"))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result, Err("bad input"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<u32, &str> = retry(5, Duration::from_millis(10), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(Retry::Transient("throttled"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_with_bounded_jitter() {
        let start = tokio::time::Instant::now();

        let _: Result<(), &str> = retry(3, Duration::from_secs(1), || async {
            Err(Retry::Transient("busy"))
        })
        .await;

        // sleeps: 1s + [0, 0.5s] then 2s + [0, 1s]
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(4500), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let _: Result<(), &str> = retry(0, Duration::from_millis(1), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Retry::Transient("nope"))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_jitter_is_bounded_by_half_the_delay() {
        for _ in 0..100 {
            assert!(jitter(Duration::from_millis(200)) <= Duration::from_millis(100));
        }
        assert_eq!(jitter(Duration::from_millis(1)), Duration::ZERO);
    }

    #[test]
    fn test_from_classified_marks_limits_transient() {
        let limited = ClassifiedError::new(ErrorKind::LimitExceeded, "service web: slow down");
        let invalid = ClassifiedError::bad_request("service web: bad subnet");

        assert!(matches!(Retry::from_classified(limited), Retry::Transient(_)));
        assert!(matches!(Retry::from_classified(invalid), Retry::Permanent(_)));
    }
}

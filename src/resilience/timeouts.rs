//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an operation against a deadline
//! - Surface a caller-chosen sentinel error when the deadline wins
//! - Decide what happens to the operation that lost the race
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The operation runs as its own task so a panic surfaces as an error
//! - Timed-out operations are aborted unless the caller asks to detach them

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

/// What happens to an operation that loses its race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Abort the operation at its next await point.
    #[default]
    Cancel,
    /// Leave the operation running; its eventual result is discarded.
    Detach,
}

/// Resolve to the operation's result if it settles within `delay`,
/// otherwise to `sentinel`.
pub async fn race<F, T, E>(
    operation: F,
    delay: Duration,
    sentinel: E,
    policy: TimeoutPolicy,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    let mut task = tokio::spawn(operation);

    match tokio::time::timeout(delay, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(E::from(join_error)),
        Err(_elapsed) => {
            match policy {
                TimeoutPolicy::Cancel => task.abort(),
                TimeoutPolicy::Detach => {
                    tracing::debug!(
                        delay_ms = delay.as_millis() as u64,
                        "Detaching timed-out operation"
                    );
                }
            }
            Err(sentinel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum TestError {
        TimedOut,
        Failed(&'static str),
        Panicked,
    }

    impl From<JoinError> for TestError {
        fn from(_: JoinError) -> Self {
            TestError::Panicked
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let result = race(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, TestError>(7)
            },
            Duration::from_millis(100),
            TestError::TimedOut,
            TimeoutPolicy::Cancel,
        )
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_error_passes_through() {
        let result: Result<(), _> = race(
            async { Err(TestError::Failed("boom")) },
            Duration::from_millis(100),
            TestError::TimedOut,
            TimeoutPolicy::Cancel,
        )
        .await;
        assert_eq!(result, Err(TestError::Failed("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins() {
        let result: Result<(), _> = race(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            Duration::from_millis(100),
            TestError::TimedOut,
            TimeoutPolicy::Cancel,
        )
        .await;
        assert_eq!(result, Err(TestError::TimedOut));
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let result: Result<(), TestError> = race(
            async {
                if true {
                    panic!("step exploded");
                }
                Ok(())
            },
            Duration::from_secs(1),
            TestError::TimedOut,
            TimeoutPolicy::Cancel,
        )
        .await;
        assert_eq!(result, Err(TestError::Panicked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loser_and_detach_keeps_it() {
        let cases = [(TimeoutPolicy::Cancel, false), (TimeoutPolicy::Detach, true)];
        for (policy, expect_finished) in cases {
            let finished = Arc::new(AtomicBool::new(false));
            let flag = finished.clone();
            let result: Result<(), _> = race(
                async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                },
                Duration::from_millis(100),
                TestError::TimedOut,
                policy,
            )
            .await;
            assert_eq!(result, Err(TestError::TimedOut));

            tokio::time::sleep(Duration::from_millis(500)).await;
            assert_eq!(finished.load(Ordering::SeqCst), expect_finished, "{policy:?}");
        }
    }
}

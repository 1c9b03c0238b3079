//! Bounded polling.
//!
//! Dashboards here render asynchronously, so every read is "poll until it is
//! there or the deadline passes". Nothing in the flow sleeps for a fixed
//! period and hopes.

use crate::error::ScrapeError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Call `probe` every `interval` until it yields `Some`, or fail with
/// [`ScrapeError::Timeout`] once `timeout` has elapsed.
///
/// A probe error counts as "not yet"; the most recent one is kept for the
/// timeout message. The probe always runs at least once, and a probe that
/// itself stalls is cut off at the deadline.
pub async fn await_condition<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ScrapeError>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut last_error = None;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match tokio::time::timeout_at(deadline, probe()).await {
            Err(_) => {
                last_error = Some("page did not respond".to_string());
            }
            Ok(Ok(Some(found))) => {
                trace!(what, attempts, elapsed = ?started.elapsed(), "condition met");
                return Ok(found);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                trace!(what, attempts, "probe failed: {e}");
                last_error = Some(e.to_string());
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ScrapeError::Timeout {
                what: what.to_string(),
                waited: started.elapsed(),
                last_error,
            });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_returns_once_condition_holds() {
        let calls = AtomicU32::new(0);
        let found = await_condition("third poll", Duration::from_secs(5), Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(if n >= 3 { Some(n) } else { None }) }
        })
        .await
        .unwrap();
        assert_eq!(found, 3);
    }

    #[tokio::test]
    async fn test_times_out_with_description() {
        let started = std::time::Instant::now();
        let err = await_condition::<(), _, _>(
            "the Hours label",
            Duration::from_millis(50),
            Duration::from_millis(10),
            || async { Ok(None) },
        )
        .await
        .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("the Hours label"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_probe_errors_are_retried_and_reported() {
        let calls = AtomicU32::new(0);
        let err = await_condition::<(), _, _>(
            "anything",
            Duration::from_millis(30),
            Duration::from_millis(5),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ScrapeError::Script {
                        what: "probe".into(),
                        detail: "detached".into(),
                    })
                }
            },
        )
        .await
        .unwrap_err();
        assert!(calls.load(Ordering::SeqCst) > 1);
        assert!(err.to_string().contains("last error: probe: detached"));
    }

    #[tokio::test]
    async fn test_stalled_probe_is_cut_off() {
        let started = std::time::Instant::now();
        let err = await_condition::<(), _, _>(
            "a hung page",
            Duration::from_millis(40),
            Duration::from_millis(5),
            || std::future::pending(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("page did not respond"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_timeout_still_probes_once() {
        let found = await_condition("now", Duration::ZERO, Duration::from_millis(10), || async {
            Ok(Some(7))
        })
        .await
        .unwrap();
        assert_eq!(found, 7);
    }
}

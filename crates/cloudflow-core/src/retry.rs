//! Bounded retry with backoff
//!
//! Every wait primitive is a probe run through [`Poller::poll_until`]: the
//! probe either observes the awaited condition or explains why not yet, and
//! the poller decides whether there is budget left for another attempt.

use crate::error::{CloudError, Result};
use crate::observer::{Event, NoopObserver, Observer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry budget and backoff schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of probe attempts
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Backoff multiplier (1.0 = fixed interval)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Fixed-interval schedule
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: interval,
            max_delay: interval,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay to wait after the zero-based `attempt` failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Budgets for each family of wait
///
/// Defaults follow the provider-side waiters: 15s x 40 for compute state,
/// 30s x 60 for database availability, 15s x 120 for deployments and
/// 30s x 40 for database login probing.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitSettings {
    pub compute: RetryConfig,
    pub database: RetryConfig,
    pub deployment: RetryConfig,
    pub login: RetryConfig,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            compute: RetryConfig::fixed(Duration::from_secs(15), 40),
            database: RetryConfig::fixed(Duration::from_secs(30), 60),
            deployment: RetryConfig::fixed(Duration::from_secs(15), 120),
            login: RetryConfig::fixed(Duration::from_secs(30), 40),
        }
    }
}

/// Result of one probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition observed
    Ready(T),
    /// Condition not observed yet, with the reason
    NotYet(String),
}

/// Suspend the current task for `duration`
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Runs probes with a shared observer and cancellation token
#[derive(Clone)]
pub struct Poller {
    observer: Arc<dyn Observer>,
    cancel: CancellationToken,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(Arc::new(NoopObserver), CancellationToken::new())
    }
}

impl Poller {
    pub fn new(observer: Arc<dyn Observer>, cancel: CancellationToken) -> Self {
        Self { observer, cancel }
    }

    pub fn observer(&self) -> &dyn Observer {
        self.observer.as_ref()
    }

    pub(crate) fn observer_arc(&self) -> Arc<dyn Observer> {
        self.observer.clone()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sleep unless cancelled first
    pub async fn delay(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(CloudError::Cancelled),
            _ = delay(duration) => Ok(()),
        }
    }

    /// Run `probe` until it is ready or `config.max_attempts` attempts have
    /// returned [`Probe::NotYet`].
    ///
    /// The probe receives the 1-based attempt number. Errors returned by the
    /// probe are not retried. There is no delay after the final attempt. On
    /// exhaustion the error is built by `on_exhausted(attempts, last_reason)`.
    pub async fn poll_until<T, F, Fut, E>(
        &self,
        operation: &str,
        config: &RetryConfig,
        mut probe: F,
        on_exhausted: E,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Probe<T>>>,
        E: FnOnce(u32, Option<String>) -> CloudError,
    {
        if self.cancel.is_cancelled() {
            return Err(CloudError::Cancelled);
        }

        let max_attempts = config.max_attempts.max(1);
        let mut last_reason = None;

        for attempt in 1..=max_attempts {
            match probe(attempt).await? {
                Probe::Ready(value) => {
                    tracing::debug!("{}: ready after {} attempt(s)", operation, attempt);
                    return Ok(value);
                }
                Probe::NotYet(reason) => {
                    self.observer.notify(&Event::AttemptFailed {
                        operation: operation.to_string(),
                        attempt,
                        max_attempts,
                        reason: reason.clone(),
                    });
                    last_reason = Some(reason);
                }
            }

            if attempt < max_attempts {
                self.delay(config.delay_for_attempt(attempt - 1)).await?;
            }
        }

        Err(on_exhausted(max_attempts, last_reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl Observer for Recorder {
        fn notify(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10000),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(10000)); // capped at max
    }

    #[test]
    fn test_fixed_delay() {
        let config = RetryConfig::fixed(Duration::from_secs(30), 40);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(30));
        assert_eq!(config.delay_for_attempt(39), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ready_on_third_attempt() {
        let recorder = Arc::new(Recorder::default());
        let poller = Poller::new(recorder.clone(), CancellationToken::new());
        let config = RetryConfig::fixed(Duration::from_secs(10), 5);
        let calls = AtomicU32::new(0);

        let start = tokio::time::Instant::now();
        let value = poller
            .poll_until(
                "test",
                &config,
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt == 3 {
                            Ok(Probe::Ready(attempt))
                        } else {
                            Ok(Probe::NotYet(format!("attempt {attempt}")))
                        }
                    }
                },
                |_, _| CloudError::Cancelled,
            )
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(recorder.0.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_exhaustion_skips_final_delay() {
        let poller = Poller::default();
        let config = RetryConfig::fixed(Duration::from_secs(10), 3);

        let start = tokio::time::Instant::now();
        let err = poller
            .poll_until(
                "test",
                &config,
                |_| async { Ok(Probe::<()>::NotYet("nope".to_string())) },
                |attempts, last| CloudError::WaitTimeout {
                    resource: last.unwrap_or_default(),
                    target: "ready".to_string(),
                    attempts,
                },
            )
            .await
            .unwrap_err();

        match err {
            CloudError::WaitTimeout {
                resource, attempts, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(resource, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_is_not_retried() {
        let poller = Poller::default();
        let config = RetryConfig::fixed(Duration::from_secs(1), 10);
        let calls = AtomicU32::new(0);

        let err = poller
            .poll_until(
                "test",
                &config,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<Probe<()>, _>(CloudError::NotFound("x".to_string())) }
                },
                |_, _| CloudError::Cancelled,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::NotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_poller_never_probes() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let poller = Poller::new(Arc::new(NoopObserver), cancel);
        let calls = AtomicU32::new(0);

        let result = tokio_test::block_on(poller.poll_until(
            "test",
            &RetryConfig::default(),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Probe::Ready(())) }
            },
            |attempts, _| CloudError::LoginTimeout { attempts },
        ));

        assert!(matches!(result, Err(CloudError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_delay() {
        let cancel = CancellationToken::new();
        let poller = Poller::new(Arc::new(NoopObserver), cancel.clone());
        let config = RetryConfig::fixed(Duration::from_secs(60), 10);
        let calls = AtomicU32::new(0);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            cancel.cancel();
        });

        let err = poller
            .poll_until(
                "test",
                &config,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Probe::<()>::NotYet("waiting".to_string())) }
                },
                |attempts, _| CloudError::LoginTimeout { attempts },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

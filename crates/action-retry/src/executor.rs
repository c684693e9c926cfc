//! Attempt loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use e2e_core_types::{Classify, ErrorKind};
use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    classify::{decide, AttemptDecision},
    errors::RetryError,
    events::{NoopRetryObserver, RetryEvent, RetryObserver, RetryPhase},
    policy::RetryPolicy,
};

/// Completed run of the attempt loop: exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { last_error: E, attempts_made: u32 },
}

impl<T, E> RetryOutcome<T, E>
where
    E: std::error::Error + 'static,
{
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    pub fn into_result(self, label: &str) -> Result<T, RetryError<E>> {
        match self {
            RetryOutcome::Success { value, .. } => Ok(value),
            RetryOutcome::Exhausted {
                last_error,
                attempts_made,
            } => Err(RetryError::Exhausted {
                label: label.to_string(),
                last_error,
                attempts_made,
            }),
        }
    }
}

/// Executes actions under a [`RetryPolicy`].
///
/// The executor is cheap to clone and holds no per-call state; the policy is
/// supplied with each call.
#[derive(Clone)]
pub struct RetryExecutor {
    observer: Arc<dyn RetryObserver>,
    cancel: CancellationToken,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(NoopRetryObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Tie attempts and backoff sleeps to a flow's cancellation.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `action` and return the value, or the final failure.
    pub async fn execute<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        action: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + Classify + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(policy, action)
            .await?
            .into_result(&policy.action_label)
    }

    /// Run the attempt loop.
    ///
    /// `Ok` carries a completed loop (success or exhaustion); `Err` covers
    /// non-retryable failures, cancellation and invalid policies.
    pub async fn run<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        mut action: F,
    ) -> Result<RetryOutcome<T, E>, RetryError<E>>
    where
        E: std::error::Error + Classify + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let label = policy.action_label.as_str();
        policy
            .validate()
            .map_err(|source| RetryError::InvalidPolicy {
                label: label.to_string(),
                source,
            })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(policy, attempt - 1));
            }

            debug!(
                "Running '{}' (attempt {}/{})",
                label, attempt, policy.max_attempts
            );
            self.emit(policy, RetryPhase::Attempt, attempt, None, None);

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(policy, attempt)),
                result = action() => result,
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        info!("'{}' succeeded on attempt {}", label, attempt);
                    }
                    self.emit(policy, RetryPhase::Succeeded, attempt, None, None);
                    return Ok(RetryOutcome::Success {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            match decide(policy, attempt, &error) {
                AttemptDecision::Exhausted => {
                    warn!(
                        "'{}' failed after {} attempt(s): {}",
                        label, attempt, error
                    );
                    self.emit(policy, RetryPhase::Exhausted, attempt, None, describe(&error));
                    return Ok(RetryOutcome::Exhausted {
                        last_error: error,
                        attempts_made: attempt,
                    });
                }
                AttemptDecision::Abort => {
                    warn!(
                        "'{}' failed with non-retryable {} error on attempt {}: {}",
                        label,
                        error.kind().as_str(),
                        attempt,
                        error
                    );
                    self.emit(
                        policy,
                        RetryPhase::NonRetryable,
                        attempt,
                        None,
                        describe(&error),
                    );
                    return Err(RetryError::NonRetryable {
                        error,
                        attempts_made: attempt,
                    });
                }
                AttemptDecision::Retry { delay } => {
                    let delay = if policy.jitter { jittered(delay) } else { delay };
                    warn!(
                        "'{}' failed (attempt {}/{}), retrying after {}ms: {}",
                        label,
                        attempt,
                        policy.max_attempts,
                        delay.as_millis(),
                        error
                    );
                    self.emit(
                        policy,
                        RetryPhase::Retrying,
                        attempt,
                        Some(delay),
                        describe(&error),
                    );

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(self.cancelled(policy, attempt)),
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn cancelled<E>(&self, policy: &RetryPolicy, attempts_made: u32) -> RetryError<E>
    where
        E: std::error::Error + 'static,
    {
        info!(
            "'{}' cancelled after {} attempt(s)",
            policy.action_label, attempts_made
        );
        self.emit(policy, RetryPhase::Cancelled, attempts_made, None, None);
        RetryError::Cancelled {
            label: policy.action_label.clone(),
            attempts_made,
        }
    }

    fn emit(
        &self,
        policy: &RetryPolicy,
        phase: RetryPhase,
        attempt: u32,
        delay: Option<Duration>,
        error: Option<(String, ErrorKind)>,
    ) {
        let (error, error_kind) = match error {
            Some((message, kind)) => (Some(message), Some(kind)),
            None => (None, None),
        };
        self.observer.on_event(&RetryEvent {
            action_label: policy.action_label.clone(),
            phase,
            attempt,
            max_attempts: policy.max_attempts,
            delay_before_next_ms: delay.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            error,
            error_kind,
        });
    }
}

fn describe<E: Classify + std::fmt::Display>(error: &E) -> Option<(String, ErrorKind)> {
    Some((error.to_string(), error.kind()))
}

fn jittered(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 {
        return delay;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
}

/// Run `action` under `policy` with a default executor (no observer, never cancelled).
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    action: F,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + Classify + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryExecutor::new().execute(policy, action).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_within_delay() {
        for _ in 0..100 {
            assert!(jittered(Duration::from_millis(200)) <= Duration::from_millis(200));
        }
        assert_eq!(jittered(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_outcome_into_result() {
        let ok: RetryOutcome<u8, e2e_core_types::DriverError> = RetryOutcome::Success {
            value: 7,
            attempts: 2,
        };
        assert!(ok.is_success());
        assert_eq!(ok.into_result("x").unwrap(), 7);
    }
}

//! Attempt-loop behaviour under paused tokio time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use action_retry::{
    execute_with_retry, RecordingRetryObserver, RetryError, RetryExecutor, RetryMatcher,
    RetryOutcome, RetryPhase, RetryPolicy,
};
use e2e_core_types::{DriverError, ErrorKind};
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Action that fails `failures` times with `error`, then returns the attempt number.
struct Flaky {
    calls: AtomicU32,
    failures: u32,
    error: DriverError,
    started_at: Mutex<Vec<Instant>>,
}

impl Flaky {
    fn new(failures: u32, error: DriverError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            failures,
            error,
            started_at: Mutex::new(Vec::new()),
        })
    }

    fn always(error: DriverError) -> Arc<Self> {
        Self::new(u32::MAX, error)
    }

    async fn call(&self) -> Result<u32, DriverError> {
        self.started_at.lock().push(Instant::now());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(self.error.clone())
        } else {
            Ok(n)
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn gaps(&self) -> Vec<Duration> {
        self.started_at
            .lock()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

fn policy(max_attempts: u32, initial_ms: u64, multiplier: f64) -> RetryPolicy {
    RetryPolicy::new("test action")
        .with_max_attempts(max_attempts)
        .with_initial_delay(Duration::from_millis(initial_ms))
        .with_backoff_multiplier(multiplier)
}

#[tokio::test(start_paused = true)]
async fn first_try_success_needs_no_delay() {
    let action = Flaky::new(0, DriverError::timeout("unused"));
    let started = Instant::now();

    let value = execute_with_retry(&policy(3, 100, 2.0), || action.call())
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(action.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_geometrically_until_exhaustion() {
    let action = Flaky::always(DriverError::timeout("still loading"));

    let err = execute_with_retry(&policy(4, 100, 2.0), || action.call())
        .await
        .unwrap_err();

    assert_eq!(action.calls(), 4);
    assert_eq!(
        action.gaps(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400)
        ]
    );
    match err {
        RetryError::Exhausted {
            attempts_made,
            last_error,
            ..
        } => {
            assert_eq!(attempts_made, 4);
            assert_eq!(last_error.kind, ErrorKind::Timeout);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_short_circuits() {
    let original = DriverError::assertion("expected heading 'Dashboard'");
    let action = Flaky::always(original.clone());
    let started = Instant::now();

    let err = execute_with_retry(&policy(5, 100, 2.0), || action.call())
        .await
        .unwrap_err();

    assert_eq!(action.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    match err {
        RetryError::NonRetryable {
            error,
            attempts_made,
        } => {
            assert_eq!(error, original);
            assert_eq!(attempts_made, 1);
        }
        other => panic!("expected passthrough, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn navigation_timeout_scenario_with_message_matchers() {
    let action = Flaky::always(DriverError::from_message("timeout waiting for navigation"));
    let observer = Arc::new(RecordingRetryObserver::new());
    let executor = RetryExecutor::new().with_observer(observer.clone());
    let policy = policy(3, 50, 3.0).retry_on_messages(["timeout"]);

    let err = executor
        .execute(&policy, || action.call())
        .await
        .unwrap_err();

    assert_eq!(action.calls(), 3);
    assert_eq!(
        action.gaps(),
        vec![Duration::from_millis(50), Duration::from_millis(150)]
    );
    assert!(err.is_exhausted());
    assert_eq!(err.attempts_made(), 3);
    assert_eq!(observer.delays_ms(), vec![50, 150]);
}

#[tokio::test(start_paused = true)]
async fn recovers_after_transient_failures() {
    let action = Flaky::new(2, DriverError::not_interactable("covered by overlay"));
    let observer = Arc::new(RecordingRetryObserver::new());
    let executor = RetryExecutor::new().with_observer(observer.clone());

    let outcome = executor
        .run(&policy(5, 10, 2.0), || action.call())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RetryOutcome::Success {
            value: 3,
            attempts: 3
        }
    );
    assert_eq!(
        observer.phases(),
        vec![
            RetryPhase::Attempt,
            RetryPhase::Retrying,
            RetryPhase::Attempt,
            RetryPhase::Retrying,
            RetryPhase::Attempt,
            RetryPhase::Succeeded
        ]
    );
    let retrying = &observer.events()[1];
    assert_eq!(retrying.action_label, "test action");
    assert_eq!(retrying.max_attempts, 5);
    assert_eq!(retrying.error_kind, Some(ErrorKind::NotInteractable));
}

#[tokio::test(start_paused = true)]
async fn single_attempt_policy_reports_exhaustion() {
    let action = Flaky::always(DriverError::assertion("nope"));

    let outcome = RetryExecutor::new()
        .run(&policy(1, 100, 2.0), || action.call())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RetryOutcome::Exhausted {
            attempts_made: 1,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn kind_matchers_exclude_unlisted_kinds() {
    let action = Flaky::always(DriverError::navigation("net::ERR_ABORTED"));
    let policy =
        policy(4, 10, 2.0).with_matchers(vec![RetryMatcher::Kind(ErrorKind::Timeout)]);

    let err = execute_with_retry(&policy, || action.call())
        .await
        .unwrap_err();

    assert!(matches!(err, RetryError::NonRetryable { .. }));
    assert_eq!(action.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_failure_reports_the_attempt_it_stopped_on() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let started = Instant::now();

    let err = execute_with_retry(&policy(5, 100, 2.0), || async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Err::<(), _>(DriverError::timeout("waiting for selector")),
            _ => Err(DriverError::assertion("expected cart total 42.00")),
        }
    })
    .await
    .unwrap_err();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(err.attempts_made(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(300));
    assert!(matches!(
        err.last_error(),
        Some(DriverError {
            kind: ErrorKind::Assertion,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn delay_cap_bounds_each_sleep() {
    let action = Flaky::always(DriverError::timeout("slow"));
    let policy = policy(4, 1000, 10.0).with_max_delay(Some(Duration::from_millis(1500)));

    let _ = execute_with_retry(&policy, || action.call()).await;

    assert_eq!(
        action.gaps(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(1500),
            Duration::from_millis(1500)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_backoff() {
    let action = Flaky::always(DriverError::timeout("slow"));
    let token = CancellationToken::new();
    let executor = RetryExecutor::new().with_cancel_token(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();
    });

    let started = Instant::now();
    let err = executor
        .execute(&policy(10, 1000, 2.0), || action.call())
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(
        err,
        RetryError::Cancelled {
            attempts_made: 1,
            ..
        }
    ));
    assert_eq!(action.calls(), 1);
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_executor_never_invokes_action() {
    let action = Flaky::new(0, DriverError::timeout("unused"));
    let token = CancellationToken::new();
    token.cancel();

    let err = RetryExecutor::new()
        .with_cancel_token(token)
        .execute(&policy(3, 10, 2.0), || action.call())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RetryError::Cancelled {
            attempts_made: 0,
            ..
        }
    ));
    assert_eq!(action.calls(), 0);
}

#[tokio::test]
async fn invalid_policy_is_rejected_before_running() {
    let action = Flaky::new(0, DriverError::timeout("unused"));

    let err = execute_with_retry(&policy(0, 10, 2.0), || action.call())
        .await
        .unwrap_err();

    assert!(matches!(err, RetryError::InvalidPolicy { .. }));
    assert_eq!(action.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn jittered_delays_never_exceed_schedule() {
    let action = Flaky::always(DriverError::timeout("slow"));
    let policy = policy(5, 100, 2.0).with_jitter(true);

    let _ = execute_with_retry(&policy, || action.call()).await;

    for (gap, ceiling) in action.gaps().into_iter().zip(policy.schedule()) {
        assert!(gap <= ceiling, "{gap:?} > {ceiling:?}");
    }
}

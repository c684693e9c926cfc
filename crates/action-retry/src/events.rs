use e2e_core_types::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Where in the attempt loop an event was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    /// About to invoke the action
    Attempt,
    /// Failed with a retryable error; a delay follows
    Retrying,
    Succeeded,
    /// Failed with an error outside the retryable set
    NonRetryable,
    Exhausted,
    Cancelled,
}

/// Structured record of one step of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryEvent {
    pub action_label: String,
    pub phase: RetryPhase,
    pub attempt: u32,
    pub max_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_before_next_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Sink for retry events; reporting collaborators attach here.
pub trait RetryObserver: Send + Sync {
    fn on_event(&self, event: &RetryEvent);
}

#[derive(Clone, Debug, Default)]
pub struct NoopRetryObserver;

impl RetryObserver for NoopRetryObserver {
    fn on_event(&self, _event: &RetryEvent) {}
}

/// Forwards events to `tracing` under the `action_retry::events` target.
///
/// Opt-in: executors report to [`NoopRetryObserver`] until one is attached.
#[derive(Clone, Debug, Default)]
pub struct TracingRetryObserver;

impl RetryObserver for TracingRetryObserver {
    fn on_event(&self, event: &RetryEvent) {
        let error = event.error.as_deref().unwrap_or("");
        match event.phase {
            RetryPhase::Attempt | RetryPhase::Succeeded => debug!(
                target: "action_retry::events",
                action = %event.action_label,
                phase = ?event.phase,
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                "retry step"
            ),
            RetryPhase::Retrying => info!(
                target: "action_retry::events",
                action = %event.action_label,
                attempt = event.attempt,
                delay_ms = event.delay_before_next_ms.unwrap_or_default(),
                error,
                "retrying"
            ),
            RetryPhase::NonRetryable | RetryPhase::Exhausted | RetryPhase::Cancelled => warn!(
                target: "action_retry::events",
                action = %event.action_label,
                phase = ?event.phase,
                attempt = event.attempt,
                error,
                "retry stopped"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingRetryObserver {
    events: Mutex<Vec<RetryEvent>>,
}

impl RecordingRetryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().clone()
    }

    pub fn phases(&self) -> Vec<RetryPhase> {
        self.events.lock().iter().map(|event| event.phase).collect()
    }

    /// Delays announced before each retry, in order.
    pub fn delays_ms(&self) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| event.delay_before_next_ms)
            .collect()
    }
}

impl RetryObserver for RecordingRetryObserver {
    fn on_event(&self, event: &RetryEvent) {
        self.events.lock().push(event.clone());
    }
}

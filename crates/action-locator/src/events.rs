use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

/// Structured record of one resolver step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LocatorEvent {
    CacheHit {
        logical_name: String,
        locator: String,
    },
    CacheEvicted {
        logical_name: String,
        locator: String,
    },
    CandidateMissed {
        logical_name: Option<String>,
        locator: String,
        error: String,
    },
    Resolved {
        logical_name: Option<String>,
        locator: String,
        index: Option<usize>,
        from_cache: bool,
    },
    NotFound {
        logical_name: Option<String>,
        tried: Vec<String>,
    },
}

/// Sink for resolver events; reporting collaborators attach here.
pub trait LocatorObserver: Send + Sync {
    fn on_event(&self, event: &LocatorEvent);
}

#[derive(Clone, Debug, Default)]
pub struct NoopLocatorObserver;

impl LocatorObserver for NoopLocatorObserver {
    fn on_event(&self, _event: &LocatorEvent) {}
}

/// Forwards events to `tracing` under the `action_locator::events` target.
///
/// Opt-in: resolvers report to [`NoopLocatorObserver`] until one is attached.
#[derive(Clone, Debug, Default)]
pub struct TracingLocatorObserver;

impl LocatorObserver for TracingLocatorObserver {
    fn on_event(&self, event: &LocatorEvent) {
        match event {
            LocatorEvent::CandidateMissed { .. } | LocatorEvent::CacheHit { .. } => {
                debug!(target: "action_locator::events", ?event, "locator event")
            }
            _ => info!(target: "action_locator::events", ?event, "locator event"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingLocatorObserver {
    events: Mutex<Vec<LocatorEvent>>,
}

impl RecordingLocatorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LocatorEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<LocatorEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl LocatorObserver for RecordingLocatorObserver {
    fn on_event(&self, event: &LocatorEvent) {
        self.events.lock().push(event.clone());
    }
}

//! Per-test flow context
//!
//! A flow owns the locator cache and attempt statistics of one test case,
//! its cancellation token and an optional wall-clock deadline. Dropping the
//! flow cancels everything still tied to it.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use action_locator::{CandidateStats, LocatorScope};
use action_retry::{RetryExecutor, RetryObserver};
use chrono::{DateTime, Utc};
use e2e_core_types::FlowId;
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{config::FlowConfig, errors::KitError};

pub struct FlowContext {
    id: FlowId,
    name: String,
    scope: LocatorScope,
    cancel: CancellationToken,
    started: Instant,
    deadline: Option<Duration>,
}

/// Snapshot of what a flow learned about its locators.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub flow_id: FlowId,
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Logical name to the candidate that last resolved it
    pub cache: BTreeMap<String, String>,
    /// Logical name to per-candidate counters
    pub stats: BTreeMap<String, BTreeMap<String, CandidateStats>>,
}

impl FlowContext {
    pub fn new(name: impl Into<String>) -> Self {
        let id = FlowId::new();
        let cancel = CancellationToken::new();
        let scope = LocatorScope::with_cancel_token(id.clone(), cancel.child_token());
        let name = name.into();
        debug!(flow = %id, "flow '{}' started", name);
        Self {
            id,
            name,
            scope,
            cancel,
            started: Instant::now(),
            deadline: None,
        }
    }

    pub fn from_config(name: impl Into<String>, config: &FlowConfig) -> Self {
        let flow = Self::new(name);
        match config.deadline() {
            Some(deadline) => flow.with_deadline(deadline),
            None => flow,
        }
    }

    /// Limit the whole flow to `deadline`, counted from creation.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn id(&self) -> &FlowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &LocatorScope {
        &self.scope
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_sub(self.started.elapsed()))
    }

    /// Token observed by every resolver probe and retry sleep of this flow.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!(flow = %self.id, "flow '{}' cancelled", self.name);
            self.cancel.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Forget cached winners, e.g. after navigating to a fresh page.
    pub fn reset(&self) {
        self.scope.reset_cache();
    }

    /// Retry executor bound to this flow's cancellation.
    pub fn retry_executor(&self, observer: Option<Arc<dyn RetryObserver>>) -> RetryExecutor {
        let executor = RetryExecutor::new().with_cancel_token(self.child_token());
        match observer {
            Some(observer) => executor.with_observer(observer),
            None => executor,
        }
    }

    /// Run `work` under the flow's cancellation and deadline.
    ///
    /// Reaching the deadline cancels the flow, so later calls fail fast too.
    pub async fn guard<F, T>(&self, work: F) -> Result<T, KitError>
    where
        F: Future<Output = T>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(KitError::Cancelled(self.id.clone())),
                value = work => Ok(value),
            }
        };

        let Some(deadline) = self.deadline else {
            return guarded.await;
        };
        match timeout_at(self.started + deadline, guarded).await {
            Ok(result) => result,
            Err(_) => {
                let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    flow = %self.id,
                    "flow '{}' exceeded its {}ms deadline", self.name, deadline_ms
                );
                self.cancel.cancel();
                Err(KitError::DeadlineExceeded {
                    flow: self.id.clone(),
                    deadline_ms,
                })
            }
        }
    }

    pub fn report(&self) -> FlowReport {
        FlowReport {
            flow_id: self.id.clone(),
            name: self.name.clone(),
            generated_at: Utc::now(),
            elapsed_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            cache: self.scope.cache().snapshot(),
            stats: self.scope.stats().snapshot(),
        }
    }
}

impl Drop for FlowContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

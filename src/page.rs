//! Page-object helpers
//!
//! [`ResilientPage`] composes the two building blocks the way test code uses
//! them: every action resolves its element through the candidate chain and
//! the whole resolve-then-interact step runs under the retry executor.

use std::sync::Arc;

use action_locator::{
    DefaultElementResolver, ElementResolver, LocatorCandidateList, LocatorError, LocatorObserver,
    Resolution, ResolveOptions, TracingLocatorObserver,
};
use action_retry::{
    RetryError, RetryExecutor, RetryObserver, RetryOutcome, RetryPolicy, TracingRetryObserver,
};
use e2e_core_types::{
    Classify, DriverError, ElementProbe, ErrorKind, Interaction, InteractionPort,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{config::KitConfig, flow::FlowContext};

/// Failure of one resolve-then-interact step.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("{interaction} on '{element}' via '{locator}' failed: {source}")]
    Interaction {
        element: String,
        locator: String,
        interaction: &'static str,
        #[source]
        source: DriverError,
    },
}

impl Classify for PageError {
    /// An element that never showed up is a timeout; cancellation and bad
    /// candidate lists are never worth retrying.
    fn kind(&self) -> ErrorKind {
        match self {
            PageError::Locator(LocatorError::NotFound(_)) => ErrorKind::Timeout,
            PageError::Locator(_) => ErrorKind::Unknown,
            PageError::Interaction { source, .. } => source.kind,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

/// What a successful page action went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub element: String,
    pub interaction: &'static str,
    /// Candidate that finally worked
    pub locator: String,
    pub from_cache: bool,
    pub attempts: u32,
}

pub type PageResult<T> = Result<T, RetryError<PageError>>;

/// Page handle bound to one flow.
pub struct ResilientPage<'f> {
    flow: &'f FlowContext,
    probe: Arc<dyn ElementProbe>,
    resolver: Arc<dyn ElementResolver>,
    driver: Arc<dyn InteractionPort>,
    retry: RetryExecutor,
    policy: RetryPolicy,
    options: ResolveOptions,
}

impl<'f> ResilientPage<'f> {
    /// With `telemetry.events` set, resolver and retry events are logged
    /// through the tracing observers.
    pub fn new(
        flow: &'f FlowContext,
        probe: Arc<dyn ElementProbe>,
        driver: Arc<dyn InteractionPort>,
        config: &KitConfig,
    ) -> Self {
        let page = Self {
            flow,
            resolver: Arc::new(DefaultElementResolver::new(probe.clone())),
            probe,
            driver,
            retry: flow.retry_executor(None),
            policy: config.retry.clone(),
            options: config.locator,
        };
        if config.telemetry.events {
            page.with_locator_observer(Arc::new(TracingLocatorObserver))
                .with_retry_observer(Arc::new(TracingRetryObserver))
        } else {
            page
        }
    }

    /// Page over a driver that implements both ports.
    pub fn over<D>(flow: &'f FlowContext, driver: Arc<D>, config: &KitConfig) -> Self
    where
        D: ElementProbe + InteractionPort + 'static,
    {
        let probe: Arc<dyn ElementProbe> = driver.clone();
        Self::new(flow, probe, driver, config)
    }

    /// Replace the resolver, e.g. one that reports to a locator observer.
    pub fn with_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_locator_observer(self, observer: Arc<dyn LocatorObserver>) -> Self {
        let resolver = DefaultElementResolver::new(self.probe.clone()).with_observer(observer);
        self.with_resolver(Arc::new(resolver))
    }

    pub fn with_retry_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.retry = self.flow.retry_executor(Some(observer));
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn flow(&self) -> &FlowContext {
        self.flow
    }

    /// Resolve once, without retries.
    pub async fn locate(&self, element: &str, candidates: &[&str]) -> Result<Resolution, PageError> {
        let candidates = LocatorCandidateList::named(element, candidates.iter().copied())?;
        Ok(self
            .resolver
            .resolve(self.flow.scope(), element, &candidates, &self.options)
            .await?)
    }

    pub async fn click(&self, element: &str, candidates: &[&str]) -> PageResult<ActionReport> {
        self.interact(element, candidates, Interaction::Click).await
    }

    pub async fn fill(
        &self,
        element: &str,
        candidates: &[&str],
        value: impl Into<String>,
    ) -> PageResult<ActionReport> {
        let value = value.into();
        self.interact(element, candidates, Interaction::Fill { value })
            .await
    }

    pub async fn press(
        &self,
        element: &str,
        candidates: &[&str],
        key: impl Into<String>,
    ) -> PageResult<ActionReport> {
        let key = key.into();
        self.interact(element, candidates, Interaction::Press { key })
            .await
    }

    /// Resolve `element` and perform `interaction`, retrying both together.
    ///
    /// A stale handle surfaces as a not-interactable error, so the next
    /// attempt resolves again instead of reusing it.
    pub async fn interact(
        &self,
        element: &str,
        candidates: &[&str],
        interaction: Interaction,
    ) -> PageResult<ActionReport> {
        let candidates = LocatorCandidateList::named(element, candidates.iter().copied())
            .map_err(rejected_before_attempt)?;
        let policy = self
            .policy
            .labeled(format!("{} '{}'", interaction.name(), element));

        let this = self;
        let candidates = &candidates;
        let interaction = &interaction;
        let outcome = self
            .retry
            .run(&policy, move || async move {
                let resolution = this
                    .resolver
                    .resolve(this.flow.scope(), element, candidates, &this.options)
                    .await?;
                this.driver
                    .perform(&resolution.handle, interaction)
                    .await
                    .map_err(|source| PageError::Interaction {
                        element: element.to_string(),
                        locator: resolution.locator.clone(),
                        interaction: interaction.name(),
                        source,
                    })?;
                Ok::<_, PageError>(resolution)
            })
            .await?;

        let attempts = match &outcome {
            RetryOutcome::Success { attempts, .. } => *attempts,
            RetryOutcome::Exhausted { attempts_made, .. } => *attempts_made,
        };
        let resolution = outcome.into_result(&policy.action_label)?;
        debug!(
            flow = %self.flow.id(),
            "{} on '{}' via '{}' after {} attempt(s)",
            interaction.name(),
            element,
            resolution.locator,
            attempts
        );
        Ok(ActionReport {
            element: element.to_string(),
            interaction: interaction.name(),
            locator: resolution.locator,
            from_cache: resolution.from_cache,
            attempts,
        })
    }

    /// Wait for whichever alternative shows up first, e.g. a success banner
    /// or an error dialog. Returns the expression that matched.
    pub async fn expect_any(&self, alternatives: &[&str]) -> PageResult<String> {
        let label = format!("expect any of {} alternatives", alternatives.len());
        let candidates = LocatorCandidateList::named(&label, alternatives.iter().copied())
            .map_err(rejected_before_attempt)?;
        let policy = self.policy.labeled(label);

        let this = self;
        let candidates = &candidates;
        let resolution = self
            .retry
            .execute(&policy, move || async move {
                this.resolver
                    .resolve_first_match(this.flow.scope(), candidates, &this.options)
                    .await
                    .map_err(PageError::from)
            })
            .await?;

        info!(flow = %self.flow.id(), "'{}' matched", resolution.locator);
        Ok(resolution.locator)
    }
}

/// Candidate lists are checked before any attempt runs.
fn rejected_before_attempt(err: LocatorError) -> RetryError<PageError> {
    RetryError::NonRetryable {
        error: PageError::from(err),
        attempts_made: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::NotFoundError;
    use e2e_core_types::ElementState;

    #[test]
    fn test_not_found_classifies_as_timeout() {
        let err = PageError::Locator(LocatorError::NotFound(NotFoundError {
            logical_name: Some("submit".into()),
            tried: vec!["#submit".into()],
            state: ElementState::Visible,
            per_candidate_timeout_ms: 100,
        }));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.message().contains("submit"));
    }

    #[test]
    fn test_cancelled_lookup_is_not_transient() {
        let err = PageError::Locator(LocatorError::Cancelled("submit".into()));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_interaction_keeps_driver_kind() {
        let err = PageError::Interaction {
            element: "submit".into(),
            locator: "#submit".into(),
            interaction: "click",
            source: DriverError::not_interactable("covered by overlay"),
        };
        assert_eq!(err.kind(), ErrorKind::NotInteractable);
        assert_eq!(
            err.to_string(),
            "click on 'submit' via '#submit' failed: NotInteractable: covered by overlay"
        );
    }
}

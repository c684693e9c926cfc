//! Element resolver with fallback chain orchestration

use std::sync::Arc;

use async_trait::async_trait;
use e2e_core_types::{DriverError, ElementHandle, ElementProbe, ErrorKind};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{errors::*, events::*, scope::LocatorScope, types::*};

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve one logical element through its candidate list
    async fn resolve(
        &self,
        scope: &LocatorScope,
        logical_name: &str,
        candidates: &LocatorCandidateList,
        options: &ResolveOptions,
    ) -> Result<Resolution, LocatorError>;

    /// Return the first of several alternative elements that is present
    async fn resolve_first_match(
        &self,
        scope: &LocatorScope,
        candidates: &LocatorCandidateList,
        options: &ResolveOptions,
    ) -> Result<Resolution, LocatorError>;
}

/// Default element resolver implementation
pub struct DefaultElementResolver {
    probe: Arc<dyn ElementProbe>,
    observer: Arc<dyn LocatorObserver>,
}

enum ProbeOutcome {
    Found(ElementHandle),
    Missed(DriverError),
}

impl DefaultElementResolver {
    /// Create a new resolver over a driver probe
    pub fn new(probe: Arc<dyn ElementProbe>) -> Self {
        Self {
            probe,
            observer: Arc::new(NoopLocatorObserver),
        }
    }

    /// Attach an observer for resolver events
    pub fn with_observer(mut self, observer: Arc<dyn LocatorObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Single candidate probe, abortable through the scope's token.
    async fn probe(
        &self,
        scope: &LocatorScope,
        label: &str,
        candidate: &str,
        options: &ResolveOptions,
    ) -> Result<ProbeOutcome, LocatorError> {
        if scope.is_cancelled() {
            return Err(LocatorError::Cancelled(label.to_string()));
        }

        tokio::select! {
            biased;
            _ = scope.cancel_token().cancelled() => {
                debug!(flow = %scope.flow_id(), "probe of '{}' cancelled", candidate);
                Err(LocatorError::Cancelled(label.to_string()))
            }
            result = self.probe.wait_for(candidate, options.state(), options.per_candidate_timeout) => {
                Ok(match result {
                    Ok(handle) => ProbeOutcome::Found(handle),
                    Err(err) => ProbeOutcome::Missed(err),
                })
            }
        }
    }

    fn missed(&self, logical_name: Option<&str>, candidate: &str, err: &DriverError) {
        if err.kind == ErrorKind::Timeout {
            debug!("candidate '{}' missed: {}", candidate, err.message);
        } else {
            warn!("candidate '{}' failed: {}", candidate, err);
        }
        self.observer.on_event(&LocatorEvent::CandidateMissed {
            logical_name: logical_name.map(str::to_string),
            locator: candidate.to_string(),
            error: err.to_string(),
        });
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve(
        &self,
        scope: &LocatorScope,
        logical_name: &str,
        candidates: &LocatorCandidateList,
        options: &ResolveOptions,
    ) -> Result<Resolution, LocatorError> {
        let started = Instant::now();
        let mut tried: Vec<String> = Vec::with_capacity(candidates.len() + 1);

        // Cache fast path
        if let Some(cached) = scope.cache().get(logical_name) {
            debug!("Trying cached candidate for '{}': {}", logical_name, cached);
            tried.push(cached.clone());

            match self.probe(scope, logical_name, &cached, options).await? {
                ProbeOutcome::Found(handle) => {
                    scope.stats().record_success(logical_name, &cached);
                    self.observer.on_event(&LocatorEvent::CacheHit {
                        logical_name: logical_name.to_string(),
                        locator: cached.clone(),
                    });
                    self.observer.on_event(&LocatorEvent::Resolved {
                        logical_name: Some(logical_name.to_string()),
                        locator: cached.clone(),
                        index: candidates.position(&cached),
                        from_cache: true,
                    });
                    return Ok(Resolution {
                        handle,
                        index: candidates.position(&cached),
                        locator: cached,
                        from_cache: true,
                        elapsed: started.elapsed(),
                    });
                }
                ProbeOutcome::Missed(err) => {
                    scope.stats().record_failure(logical_name, &cached);
                    self.missed(Some(logical_name), &cached, &err);
                    if scope.cache().evict_if(logical_name, &cached) {
                        info!(
                            "Evicted stale cache entry for '{}': {}",
                            logical_name, cached
                        );
                        self.observer.on_event(&LocatorEvent::CacheEvicted {
                            logical_name: logical_name.to_string(),
                            locator: cached.clone(),
                        });
                    }
                }
            }
        }

        // Full scan in priority order, stale cached candidate included
        for (index, candidate) in candidates.iter().enumerate() {
            if !tried.iter().any(|t| t == candidate) {
                tried.push(candidate.to_string());
            }

            match self.probe(scope, logical_name, candidate, options).await? {
                ProbeOutcome::Found(handle) => {
                    scope.stats().record_success(logical_name, candidate);
                    scope.cache().put(logical_name, candidate);

                    info!(
                        "Resolved '{}' with candidate #{}: {}",
                        logical_name, index, candidate
                    );
                    self.observer.on_event(&LocatorEvent::Resolved {
                        logical_name: Some(logical_name.to_string()),
                        locator: candidate.to_string(),
                        index: Some(index),
                        from_cache: false,
                    });

                    return Ok(Resolution {
                        handle,
                        locator: candidate.to_string(),
                        index: Some(index),
                        from_cache: false,
                        elapsed: started.elapsed(),
                    });
                }
                ProbeOutcome::Missed(err) => {
                    scope.stats().record_failure(logical_name, candidate);
                    self.missed(Some(logical_name), candidate, &err);
                }
            }
        }

        // All candidates failed
        let err = NotFoundError {
            logical_name: Some(logical_name.to_string()),
            tried,
            state: options.state(),
            per_candidate_timeout_ms: options.timeout_ms(),
        };
        warn!("{}", err);
        self.observer.on_event(&LocatorEvent::NotFound {
            logical_name: err.logical_name.clone(),
            tried: err.tried.clone(),
        });
        Err(err.into())
    }

    async fn resolve_first_match(
        &self,
        scope: &LocatorScope,
        candidates: &LocatorCandidateList,
        options: &ResolveOptions,
    ) -> Result<Resolution, LocatorError> {
        let started = Instant::now();
        let label = format!("any of {}", candidates.len());

        for (index, candidate) in candidates.iter().enumerate() {
            match self.probe(scope, &label, candidate, options).await? {
                ProbeOutcome::Found(handle) => {
                    info!("First match among {}: {}", candidates.len(), candidate);
                    self.observer.on_event(&LocatorEvent::Resolved {
                        logical_name: None,
                        locator: candidate.to_string(),
                        index: Some(index),
                        from_cache: false,
                    });
                    return Ok(Resolution {
                        handle,
                        locator: candidate.to_string(),
                        index: Some(index),
                        from_cache: false,
                        elapsed: started.elapsed(),
                    });
                }
                ProbeOutcome::Missed(err) => self.missed(None, candidate, &err),
            }
        }

        let err = NotFoundError {
            logical_name: None,
            tried: candidates.as_slice().to_vec(),
            state: options.state(),
            per_candidate_timeout_ms: options.timeout_ms(),
        };
        warn!("{}", err);
        self.observer.on_event(&LocatorEvent::NotFound {
            logical_name: None,
            tried: err.tried.clone(),
        });
        Err(err.into())
    }
}

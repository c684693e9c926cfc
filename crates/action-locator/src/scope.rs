use e2e_core_types::FlowId;
use tokio_util::sync::CancellationToken;

use crate::{cache::ResolutionCache, stats::AttemptStats};

/// Mutable resolver state owned by one test flow.
///
/// Passing the scope explicitly keeps cache entries from one test out of
/// every other test; nothing here is process-wide.
#[derive(Debug)]
pub struct LocatorScope {
    flow_id: FlowId,
    cache: ResolutionCache,
    stats: AttemptStats,
    cancel: CancellationToken,
}

impl LocatorScope {
    pub fn new(flow_id: FlowId) -> Self {
        Self::with_cancel_token(flow_id, CancellationToken::new())
    }

    pub fn with_cancel_token(flow_id: FlowId, cancel: CancellationToken) -> Self {
        Self {
            flow_id,
            cache: ResolutionCache::new(),
            stats: AttemptStats::new(),
            cancel,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn stats(&self) -> &AttemptStats {
        &self.stats
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Clear cached winners between runs; counters are kept.
    pub fn reset_cache(&self) {
        self.cache.clear();
    }
}

impl Default for LocatorScope {
    fn default() -> Self {
        Self::new(FlowId::new())
    }
}

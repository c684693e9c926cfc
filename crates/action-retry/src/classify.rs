//! Error classification and per-attempt decisions

use std::time::Duration;

use e2e_core_types::{Classify, ErrorKind};
use serde::{Deserialize, Serialize};

use crate::policy::RetryPolicy;

/// One rule marking an error as retryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMatcher {
    /// Match on the classified kind
    Kind(ErrorKind),

    /// Case-insensitive substring of the error message
    Message(String),
}

impl RetryMatcher {
    pub fn matches<E: Classify>(&self, error: &E) -> bool {
        match self {
            RetryMatcher::Kind(kind) => error.kind() == *kind,
            RetryMatcher::Message(needle) => error
                .message()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// What happens after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Sleep `delay` and try again
    Retry { delay: Duration },

    /// Last attempt used
    Exhausted,

    /// Not retryable; surface the error as-is
    Abort,
}

/// Decide the fate of failed attempt `attempt` (1-based).
///
/// The attempt budget is checked before classification: a failure on the
/// final attempt is always reported as exhaustion.
pub fn decide<E: Classify>(policy: &RetryPolicy, attempt: u32, error: &E) -> AttemptDecision {
    if attempt >= policy.max_attempts {
        AttemptDecision::Exhausted
    } else if !policy.is_retryable(error) {
        AttemptDecision::Abort
    } else {
        AttemptDecision::Retry {
            delay: policy.delay_for(attempt),
        }
    }
}

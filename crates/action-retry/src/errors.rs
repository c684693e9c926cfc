//! Retry execution error types

use thiserror::Error;

/// Policy rejected before the first attempt
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("backoff_multiplier must be a finite number >= 1, got {0}")]
    InvalidMultiplier(f64),
}

/// Final failure of a retried action.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt was used on failures
    #[error("'{label}' failed after {attempts_made} attempt(s); last error: {last_error}")]
    Exhausted {
        label: String,
        #[source]
        last_error: E,
        attempts_made: u32,
    },

    /// Classified as non-transient; displays as the original error
    #[error("{error}")]
    NonRetryable { error: E, attempts_made: u32 },

    /// The owning flow was cancelled mid-attempt or mid-backoff
    #[error("'{label}' cancelled after {attempts_made} attempt(s)")]
    Cancelled { label: String, attempts_made: u32 },

    /// Invalid policy
    #[error("invalid retry policy for '{label}': {source}")]
    InvalidPolicy {
        label: String,
        #[source]
        source: PolicyError,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn attempts_made(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts_made, .. }
            | RetryError::NonRetryable { attempts_made, .. }
            | RetryError::Cancelled { attempts_made, .. } => *attempts_made,
            RetryError::InvalidPolicy { .. } => 0,
        }
    }

    /// Error produced by the action itself, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last_error, .. } => Some(last_error),
            RetryError::NonRetryable { error, .. } => Some(error),
            _ => None,
        }
    }
}

//! Error types for locator system

use std::fmt;

use e2e_core_types::ElementState;
use serde::Serialize;
use thiserror::Error;

/// Every candidate was probed and none reached the required state.
///
/// Two resolutions over the same unresolvable candidates produce equal
/// values; nothing call-specific is recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFoundError {
    /// Logical element name, absent for first-match lookups
    pub logical_name: Option<String>,

    /// Locator expressions that were probed, in probe order
    pub tried: Vec<String>,

    /// State the candidates had to reach
    pub state: ElementState,

    /// Wait budget each candidate was given
    pub per_candidate_timeout_ms: u64,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.logical_name {
            Some(name) => write!(f, "element '{}' not found", name)?,
            None => write!(f, "none of {} alternatives found", self.tried.len())?,
        }
        write!(
            f,
            ": no candidate became {} within {}ms; tried [{}]",
            self.state.as_str(),
            self.per_candidate_timeout_ms,
            self.tried.join(", ")
        )
    }
}

impl std::error::Error for NotFoundError {}

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// All candidates exhausted
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Candidate list was empty
    #[error("Candidate list for '{0}' is empty")]
    EmptyCandidates(String),

    /// A candidate expression was blank
    #[error("Candidate #{index} for '{name}' is blank")]
    BlankCandidate { name: String, index: usize },

    /// The owning flow was cancelled while probing
    #[error("Resolution of '{0}' cancelled")]
    Cancelled(String),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::NotFound(_))
    }

    pub fn not_found(&self) -> Option<&NotFoundError> {
        match self {
            LocatorError::NotFound(err) => Some(err),
            _ => None,
        }
    }
}

//! Core types for locator system

use std::time::Duration;

use e2e_core_types::{ElementHandle, ElementState};
use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Ordered, non-empty list of locator expressions for one logical element.
///
/// Position is priority: the first candidate that resolves wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LocatorCandidateList(Vec<String>);

impl LocatorCandidateList {
    /// Build a list, rejecting empty lists and blank expressions.
    pub fn new<I, S>(candidates: I) -> Result<Self, LocatorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::named("<anonymous>", candidates)
    }

    /// Same as [`LocatorCandidateList::new`], naming the element in errors.
    pub fn named<I, S>(name: &str, candidates: I) -> Result<Self, LocatorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = candidates.into_iter().map(Into::into).collect();
        if list.is_empty() {
            return Err(LocatorError::EmptyCandidates(name.to_string()));
        }
        if let Some(index) = list.iter().position(|c| c.trim().is_empty()) {
            return Err(LocatorError::BlankCandidate {
                name: name.to_string(),
                index,
            });
        }
        Ok(Self(list))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, expression: &str) -> Option<usize> {
        self.0.iter().position(|c| c == expression)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for LocatorCandidateList {
    type Error = LocatorError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocatorCandidateList> for Vec<String> {
    fn from(list: LocatorCandidateList) -> Self {
        list.0
    }
}

/// Per-call resolution options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// How long each candidate may take to reach the required state
    #[serde(with = "duration_ms", rename = "per_candidate_timeout_ms")]
    pub per_candidate_timeout: Duration,

    /// Require `visible` instead of `attached`
    pub require_visible: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            per_candidate_timeout: Duration::from_millis(3000),
            require_visible: true,
        }
    }
}

impl ResolveOptions {
    pub fn new(per_candidate_timeout: Duration, require_visible: bool) -> Self {
        Self {
            per_candidate_timeout,
            require_visible,
        }
    }

    /// Set per-candidate timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_candidate_timeout = timeout;
        self
    }

    /// Accept attached-but-hidden elements
    pub fn attached_only(mut self) -> Self {
        self.require_visible = false;
        self
    }

    pub fn state(&self) -> ElementState {
        ElementState::from_visibility(self.require_visible)
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.per_candidate_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Element resolution result
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Handle returned by the driver
    pub handle: ElementHandle,

    /// Candidate expression that resolved
    pub locator: String,

    /// Position of the winner in the supplied list, if it is part of it
    pub index: Option<usize>,

    /// Whether the cached candidate answered without a scan
    pub from_cache: bool,

    /// Wall time spent resolving, cache probe and scan included
    pub elapsed: Duration,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

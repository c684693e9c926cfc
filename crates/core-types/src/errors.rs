//! Error taxonomy shared by driver adapters and the retry classifier

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed classification of UI driver failures.
///
/// Adapters populate the kind at the boundary so that retry decisions never
/// depend on free-text parsing deeper in the stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Waiting for an element, navigation or network settled past its limit
    Timeout,

    /// Element exists but cannot receive the interaction (obscured, detached, disabled)
    NotInteractable,

    /// Navigation was interrupted or failed
    Navigation,

    /// An expectation about page content did not hold
    Assertion,

    /// Anything the adapter could not place
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Timeout,
        ErrorKind::NotInteractable,
        ErrorKind::Navigation,
        ErrorKind::Assertion,
        ErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::NotInteractable => "not_interactable",
            ErrorKind::Navigation => "navigation",
            ErrorKind::Assertion => "assertion",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Best-effort classification for adapters that only surface a message.
    pub fn from_message(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        let has = |needle: &str| lowered.contains(needle);

        if has("timeout") || has("timed out") {
            ErrorKind::Timeout
        } else if has("not interactable")
            || has("not clickable")
            || has("not enabled")
            || has("detached")
            || has("intercept")
        {
            ErrorKind::NotInteractable
        } else if has("navigation") || has("net::") {
            ErrorKind::Navigation
        } else if has("expect") || has("assert") {
            ErrorKind::Assertion
        } else {
            ErrorKind::Unknown
        }
    }

    /// Kinds that are transient by nature.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::NotInteractable | ErrorKind::Navigation
        )
    }
}

/// Failure reported by a UI driver port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct DriverError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error whose kind is derived from the message text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::from_message(&message),
            message,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotInteractable, message)
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Navigation, message)
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion, message)
    }
}

/// Errors the retry executor can reason about.
pub trait Classify {
    fn kind(&self) -> ErrorKind;

    fn message(&self) -> String;
}

impl Classify for DriverError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_message() {
        assert_eq!(
            ErrorKind::from_message("Timeout 5000ms exceeded"),
            ErrorKind::Timeout
        );
        assert_eq!(
            ErrorKind::from_message("element is not clickable at point"),
            ErrorKind::NotInteractable
        );
        assert_eq!(
            ErrorKind::from_message("net::ERR_ABORTED while loading"),
            ErrorKind::Navigation
        );
        assert_eq!(
            ErrorKind::from_message("expected 'Welcome' to be visible"),
            ErrorKind::Assertion
        );
        assert_eq!(ErrorKind::from_message("boom"), ErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_wins_over_navigation() {
        assert_eq!(
            ErrorKind::from_message("timeout waiting for navigation"),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::Timeout.is_transient());
        assert!(ErrorKind::Navigation.is_transient());
        assert!(!ErrorKind::Assertion.is_transient());
        assert!(!ErrorKind::Unknown.is_transient());
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::timeout("waiting for #submit");
        assert_eq!(err.to_string(), "Timeout: waiting for #submit");
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }
}

//! Shared primitives for the resilient-e2e crates.
//!
//! Everything the locator resolver, the retry executor and the page layer
//! agree on lives here: the closed error taxonomy, element handles and the
//! two UI driver ports.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod errors;
pub mod ports;

#[cfg(feature = "fake")]
pub mod fake;

pub use errors::{Classify, DriverError, ErrorKind};
pub use ports::{ElementProbe, InteractionPort};

/// Identifier of one logical test flow (one test case on one worker).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State an element must reach before a probe counts as a success.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementState {
    /// Present in the DOM, visible or not.
    Attached,
    /// Present and rendered with a non-empty box.
    #[default]
    Visible,
}

impl ElementState {
    pub fn from_visibility(require_visible: bool) -> Self {
        if require_visible {
            ElementState::Visible
        } else {
            ElementState::Attached
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Attached => "attached",
            ElementState::Visible => "visible",
        }
    }
}

/// Driver-side reference to an element that satisfied a probe.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Locator expression that produced this handle.
    pub locator: String,

    /// Opaque driver node reference.
    pub element_id: String,
}

impl ElementHandle {
    pub fn new(locator: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            element_id: element_id.into(),
        }
    }
}

/// Interaction performed on a resolved handle.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    Click,
    Fill { value: String },
    Press { key: String },
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Click => "click",
            Interaction::Fill { .. } => "fill",
            Interaction::Press { .. } => "press",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_visibility_flag() {
        assert_eq!(ElementState::from_visibility(true), ElementState::Visible);
        assert_eq!(ElementState::from_visibility(false), ElementState::Attached);
    }

    #[test]
    fn flow_ids_are_unique() {
        assert_ne!(FlowId::new(), FlowId::new());
    }

    #[test]
    fn interaction_names() {
        assert_eq!(Interaction::Click.name(), "click");
        assert_eq!(
            Interaction::Fill {
                value: "alice".into()
            }
            .name(),
            "fill"
        );
        assert_eq!(ElementState::Attached.as_str(), "attached");
    }
}

//! In-memory page used by tests across the workspace.
//!
//! Elements are keyed by their exact locator expression. Timing runs on the
//! tokio clock so tests can pause time and observe waits deterministically.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, sleep_until, Instant};

use crate::{
    DriverError, ElementHandle, ElementProbe, ElementState, Interaction, InteractionPort,
};

#[derive(Clone, Debug)]
struct FakeElement {
    element_id: String,
    visible: bool,
    appears_at: Option<Instant>,
}

impl FakeElement {
    fn satisfies(&self, state: ElementState) -> bool {
        match state {
            ElementState::Attached => true,
            ElementState::Visible => self.visible,
        }
    }
}

#[derive(Default)]
struct FakeState {
    elements: HashMap<String, FakeElement>,
    probes: Vec<String>,
    interactions: Vec<(String, Interaction)>,
    scripted_failures: HashMap<String, VecDeque<DriverError>>,
    next_id: u64,
}

/// Scriptable page implementing both driver ports.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FakePage::add_element`].
    pub fn with_element(self, expression: &str) -> Self {
        self.add_element(expression);
        self
    }

    /// Add a visible element present immediately.
    pub fn add_element(&self, expression: &str) {
        self.insert(expression, true, None);
    }

    /// Add an element that is attached but not visible.
    pub fn add_hidden_element(&self, expression: &str) {
        self.insert(expression, false, None);
    }

    /// Add a visible element that only shows up after `delay`.
    pub fn add_element_after(&self, expression: &str, delay: Duration) {
        self.insert(expression, true, Some(Instant::now() + delay));
    }

    pub fn remove_element(&self, expression: &str) {
        self.state.lock().elements.remove(expression);
    }

    pub fn set_visible(&self, expression: &str, visible: bool) {
        if let Some(element) = self.state.lock().elements.get_mut(expression) {
            element.visible = visible;
        }
    }

    /// Queue a failure returned by the next interaction on `expression`.
    pub fn fail_next_interaction(&self, expression: &str, error: DriverError) {
        self.state
            .lock()
            .scripted_failures
            .entry(expression.to_string())
            .or_default()
            .push_back(error);
    }

    /// Every probed expression, in call order.
    pub fn probes(&self) -> Vec<String> {
        self.state.lock().probes.clone()
    }

    pub fn probe_count(&self, expression: &str) -> usize {
        self.state
            .lock()
            .probes
            .iter()
            .filter(|probe| probe.as_str() == expression)
            .count()
    }

    pub fn clear_probes(&self) {
        self.state.lock().probes.clear();
    }

    /// Interactions that reached the page, successful or not.
    pub fn interactions(&self) -> Vec<(String, Interaction)> {
        self.state.lock().interactions.clone()
    }

    fn insert(&self, expression: &str, visible: bool, appears_at: Option<Instant>) {
        let mut state = self.state.lock();
        state.next_id += 1;
        let element_id = format!("node-{}", state.next_id);
        state.elements.insert(
            expression.to_string(),
            FakeElement {
                element_id,
                visible,
                appears_at,
            },
        );
    }
}

#[async_trait]
impl ElementProbe for FakePage {
    async fn wait_for(
        &self,
        expression: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError> {
        let now = Instant::now();
        let ready = {
            let mut guard = self.state.lock();
            guard.probes.push(expression.to_string());
            guard
                .elements
                .get(expression)
                .filter(|element| element.satisfies(state))
                .map(|element| {
                    let at = element.appears_at.map_or(now, |at| at.max(now));
                    (at, element.element_id.clone())
                })
        };

        match ready {
            Some((at, element_id)) if at <= now + timeout => {
                sleep_until(at).await;
                Ok(ElementHandle::new(expression, element_id))
            }
            _ => {
                sleep(timeout).await;
                Err(DriverError::timeout(format!(
                    "timeout {}ms exceeded waiting for '{}' to be {}",
                    timeout.as_millis(),
                    expression,
                    state.as_str()
                )))
            }
        }
    }
}

#[async_trait]
impl InteractionPort for FakePage {
    async fn perform(
        &self,
        handle: &ElementHandle,
        interaction: &Interaction,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state
            .interactions
            .push((handle.locator.clone(), interaction.clone()));

        if let Some(error) = state
            .scripted_failures
            .get_mut(&handle.locator)
            .and_then(|queue| queue.pop_front())
        {
            return Err(error);
        }

        if !state.elements.contains_key(&handle.locator) {
            return Err(DriverError::not_interactable(format!(
                "element '{}' is detached from the DOM",
                handle.locator
            )));
        }

        Ok(())
    }
}

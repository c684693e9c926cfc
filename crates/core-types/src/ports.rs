use std::time::Duration;

use async_trait::async_trait;

use crate::{DriverError, ElementHandle, ElementState, Interaction};

/// Element waiting primitive of the UI driver.
#[async_trait]
pub trait ElementProbe: Send + Sync {
    /// Wait up to `timeout` for `expression` to reach `state`.
    ///
    /// A miss is reported as a [`DriverError`] of kind `Timeout`.
    async fn wait_for(
        &self,
        expression: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError>;
}

/// Interaction primitive of the UI driver.
#[async_trait]
pub trait InteractionPort: Send + Sync {
    async fn perform(
        &self,
        handle: &ElementHandle,
        interaction: &Interaction,
    ) -> Result<(), DriverError>;
}

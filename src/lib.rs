//! resilient-e2e library
//!
//! Test-flow plumbing around the locator resolver and retry executor:
//! configuration, tracing setup, per-flow context and page-object helpers.

pub mod budget;
pub mod config;
pub mod errors;
pub mod flow;
pub mod page;
pub mod telemetry;

pub use action_locator::{
    DefaultElementResolver, ElementResolver, LocatorCandidateList, LocatorError, LocatorEvent,
    LocatorObserver, LocatorScope, NotFoundError, Resolution, ResolveOptions,
};
pub use action_retry::{
    execute_with_retry, RetryError, RetryEvent, RetryExecutor, RetryMatcher, RetryObserver,
    RetryOutcome, RetryPhase, RetryPolicy,
};
pub use budget::LatencyBudget;
pub use config::{load_config, FlowConfig, KitConfig, LoadedConfig, TelemetryConfig};
pub use e2e_core_types::{
    Classify, DriverError, ElementHandle, ElementProbe, ElementState, ErrorKind, FlowId,
    Interaction, InteractionPort,
};
pub use errors::KitError;
pub use flow::{FlowContext, FlowReport};
pub use page::{ActionReport, PageError, PageResult, ResilientPage};

//! Retry executor
//!
//! Runs a fallible async action under a [`RetryPolicy`]: geometric backoff
//! between attempts, retries only for errors the policy classifies as
//! transient, and an observable record for every attempt.

pub mod classify;
pub mod errors;
pub mod events;
pub mod executor;
pub mod policy;

pub use classify::{AttemptDecision, RetryMatcher};
pub use errors::{PolicyError, RetryError};
pub use events::{
    NoopRetryObserver, RecordingRetryObserver, RetryEvent, RetryObserver, RetryPhase,
    TracingRetryObserver,
};
pub use executor::{execute_with_retry, RetryExecutor, RetryOutcome};
pub use policy::RetryPolicy;

//! Locator fallback resolution
//!
//! This crate turns a logical element name plus an ordered list of candidate
//! locator expressions into a handle for whichever candidate is present:
//! - Candidates are probed strictly in priority order
//! - The winning candidate is cached per logical name for the flow
//! - A cached candidate that stops matching is evicted and the scan reruns
//! - Every probe is counted per (logical name, candidate) for reporting

pub mod cache;
pub mod errors;
pub mod events;
pub mod resolver;
pub mod scope;
pub mod stats;
pub mod types;

pub use cache::*;
pub use errors::*;
pub use events::*;
pub use resolver::*;
pub use scope::*;
pub use stats::*;
pub use types::*;

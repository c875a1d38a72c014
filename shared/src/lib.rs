//! Shared types for the prompt evaluation engine
//!
//! Contains the domain model exchanged between the engine components and
//! their callers, the provider error taxonomy, and tracing setup.
//! Component-internal types stay in the engine crate.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;

//! Common types shared across the execution simulator services
//!
//! Provides the fixed-point amount model, market identity and the canonical
//! market-data event types. Everything here is integer arithmetic on counts;
//! floating point only appears at display/API boundaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;

//! Footprint Runtime - investigation coordinator
//!
//! Wires configuration, the shared compliant fetcher, discovery, known-profile
//! collection and correlation into a single run with a runtime budget.

pub mod investigation;

pub use investigation::*;

//! Footprint Analysis - discovery and correlation
//!
//! - Username candidate generation from seed identifiers
//! - Platform existence heuristics and confidence scoring
//! - Concurrent profile discovery over a `PageFetcher`
//! - Known-profile collection and platform trait inference
//! - Cross-platform correlation, clustering and risk scoring

pub mod candidates;
pub mod collector;
pub mod correlator;
pub mod discovery;
pub mod heuristics;
pub mod inference;
pub mod scoring;
pub mod similarity;

pub use candidates::*;
pub use collector::*;
pub use correlator::*;
pub use discovery::*;
pub use heuristics::*;
pub use inference::*;
pub use scoring::*;
pub use similarity::*;

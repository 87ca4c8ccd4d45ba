//! Footprint Core - data model and rules for public-profile discovery
//!
//! This crate provides the foundational primitives:
//! - Provenance records and collected records
//! - Profile candidates, correlation results and clusters
//! - Platform registry with URL templates and reliability scores
//! - Sensitivity classification of collected fields
//! - Configuration with fail-fast validation

pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod platforms;
pub mod provenance;
pub mod report;

pub use classifier::*;
pub use config::*;
pub use error::*;
pub use model::*;
pub use platforms::*;
pub use provenance::*;
pub use report::*;

/// Default robots.txt cache TTL in seconds
pub const DEFAULT_ROBOTS_TTL_SECS: u64 = 3600;

/// Crawl delay assumed when robots.txt declares none
pub const DEFAULT_CRAWL_DELAY_SECS: f64 = 1.0;

/// Reliability score for platforms missing from the registry
pub const UNKNOWN_PLATFORM_RELIABILITY: f64 = 50.0;

/// Minimum confidence score
pub const MIN_CONFIDENCE: f64 = 0.0;

/// Maximum confidence score
pub const MAX_CONFIDENCE: f64 = 100.0;

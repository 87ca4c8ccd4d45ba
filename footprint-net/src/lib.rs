//! Footprint Net - polite HTTP layer
//!
//! Everything that talks to the network goes through here:
//! - HTTP client with a declared, identifiable user agent
//! - Per-domain sliding-window rate limiting
//! - robots.txt parsing with a TTL cache (fail-open)
//! - Public-field extraction from API payloads and markup pages
//! - The compliant fetcher and the `PageFetcher` seam used by discovery

pub mod client;
pub mod extract;
pub mod fetcher;
pub mod rate_limit;
pub mod robots;

pub use client::*;
pub use extract::*;
pub use fetcher::*;
pub use rate_limit::*;
pub use robots::*;

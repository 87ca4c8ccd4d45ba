//! Configuration errors
//!
//! Invalid weights or thresholds are the only fatal error category:
//! they are reported before any network activity starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid weight {name}: {value} (must be within 0.0..=1.0)")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("Correlation weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("Invalid threshold {name}: {reason}")]
    Threshold { name: &'static str, reason: String },

    #[error("Invalid politeness setting {name}: {reason}")]
    Politeness { name: &'static str, reason: String },

    #[error("Invalid platform {platform}: {reason}")]
    Platform { platform: String, reason: String },

    #[error("Invalid discovery setting {name}: {reason}")]
    Discovery { name: &'static str, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

//! Run configuration
//!
//! Loaded from an optional TOML file; every field has a default so a partial
//! file (or none at all) is valid. [`FootprintConfig::validate`] must pass
//! before any component is built.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{default_platforms, ConfigError, PlatformSpec, USERNAME_PLACEHOLDER};

/// Tolerance when checking that weights sum to one
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Declared crawler identity sent with every request
pub const DEFAULT_USER_AGENT: &str =
    "FootprintAudit/0.1 (+https://github.com/footprint-osint/footprint; public-profile self-audit)";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub politeness: PolitenessConfig,
    pub discovery: DiscoveryConfig,
    pub correlation: CorrelationConfig,
}

impl FootprintConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.politeness.validate()?;
        self.discovery.validate()?;
        self.correlation.validate()
    }
}

/// Rate limits, robots handling and retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    pub max_requests_per_minute: usize,
    pub max_requests_per_hour: usize,
    /// Floor on the spacing between two requests to one domain
    pub min_request_delay_secs: f64,
    /// Spacing used when robots.txt declares no Crawl-delay
    pub default_crawl_delay_secs: f64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Upper bound on a server-requested Retry-After wait
    pub max_retry_after_secs: u64,
    pub robots_cache_ttl_secs: u64,
    pub respect_robots_txt: bool,
    pub user_agent: String,
    pub max_body_bytes: usize,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 30,
            max_requests_per_hour: 500,
            min_request_delay_secs: 1.0,
            default_crawl_delay_secs: crate::DEFAULT_CRAWL_DELAY_SECS,
            request_timeout_secs: 10,
            max_retries: 2,
            backoff_base_ms: 1000,
            max_retry_after_secs: 60,
            robots_cache_ttl_secs: crate::DEFAULT_ROBOTS_TTL_SECS,
            respect_robots_txt: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl PolitenessConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn robots_ttl(&self) -> Duration {
        Duration::from_secs(self.robots_cache_ttl_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |name, reason: &str| {
            Err(ConfigError::Politeness {
                name,
                reason: reason.to_string(),
            })
        };

        if self.max_requests_per_minute == 0 {
            return fail("max_requests_per_minute", "must be greater than zero");
        }
        if self.max_requests_per_hour < self.max_requests_per_minute {
            return fail("max_requests_per_hour", "must be at least max_requests_per_minute");
        }
        if self.request_timeout_secs == 0 {
            return fail("request_timeout_secs", "must be greater than zero");
        }
        if !(self.min_request_delay_secs >= 0.0) || !(self.default_crawl_delay_secs >= 0.0) {
            return fail("min_request_delay_secs", "delays must be non-negative");
        }
        if self.user_agent.trim().is_empty() {
            return fail("user_agent", "a declared user agent is required");
        }
        if self.max_body_bytes == 0 {
            return fail("max_body_bytes", "must be greater than zero");
        }
        Ok(())
    }
}

/// Candidate generation and probe pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub year_range_start: u16,
    pub year_range_end: u16,
    pub max_concurrent_probes: usize,
    /// Per-probe deadline, covering politeness waits and retries
    pub probe_timeout_secs: u64,
    pub max_candidates: Option<usize>,
    pub platforms: Vec<PlatformSpec>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            year_range_start: 1980,
            year_range_end: 2004,
            max_concurrent_probes: 4,
            probe_timeout_secs: 30,
            max_candidates: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn enabled_platforms(&self) -> impl Iterator<Item = &PlatformSpec> {
        self.platforms.iter().filter(|p| p.enabled)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.year_range_start > self.year_range_end {
            return Err(ConfigError::Discovery {
                name: "year_range_start",
                reason: format!(
                    "{} is after year_range_end {}",
                    self.year_range_start, self.year_range_end
                ),
            });
        }
        if self.max_concurrent_probes == 0 {
            return Err(ConfigError::Discovery {
                name: "max_concurrent_probes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Discovery {
                name: "probe_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        for platform in self.enabled_platforms() {
            if platform.name.trim().is_empty() {
                return Err(ConfigError::Platform {
                    platform: platform.name.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            if !platform
                .url_templates
                .iter()
                .any(|t| t.contains(USERNAME_PLACEHOLDER))
            {
                return Err(ConfigError::Platform {
                    platform: platform.name.clone(),
                    reason: format!("needs a URL template containing {}", USERNAME_PLACEHOLDER),
                });
            }
            if !(0.0..=100.0).contains(&platform.reliability) {
                return Err(ConfigError::Platform {
                    platform: platform.name.clone(),
                    reason: format!("reliability {} outside 0..=100", platform.reliability),
                });
            }
        }
        Ok(())
    }
}

/// Relative weight of each correlation signal in the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub username_similarity: f64,
    pub name_matching: f64,
    pub temporal_pattern: f64,
    pub metadata_matching: f64,
    /// Share reserved for signals not computed here (content, network overlap)
    pub residual: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            username_similarity: 0.30,
            name_matching: 0.25,
            temporal_pattern: 0.15,
            metadata_matching: 0.10,
            residual: 0.20,
        }
    }
}

impl SignalWeights {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("username_similarity", self.username_similarity),
            ("name_matching", self.name_matching),
            ("temporal_pattern", self.temporal_pattern),
            ("metadata_matching", self.metadata_matching),
            ("residual", self.residual),
        ]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }

        let sum: f64 = self.entries().iter().map(|(_, v)| v).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Overall-score cutoffs for the risk verdict (strictly greater than)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 80.0,
            medium: 50.0,
            low: 30.0,
        }
    }
}

/// Strength and size cutoffs for per-cluster risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterThresholds {
    pub high_strength: f64,
    pub high_members: usize,
    pub medium_strength: f64,
    pub medium_members: usize,
    pub low_strength: f64,
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            high_strength: 80.0,
            high_members: 4,
            medium_strength: 60.0,
            medium_members: 3,
            low_strength: 40.0,
        }
    }
}

/// Correlator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum pairwise username similarity (exclusive) to emit a correlation
    pub username_similarity_threshold: f64,
    /// Minimum share of matching metadata fields (exclusive)
    pub metadata_match_threshold: f64,
    pub temporal_confidence: f64,
    /// Privacy impact above which a correlation counts as high-impact
    pub high_impact_privacy_threshold: f64,
    /// High-impact correlations needed to escalate the verdict
    pub high_impact_escalation_count: usize,
    /// Cluster size that escalates the verdict
    pub large_cluster_size: usize,
    pub weights: SignalWeights,
    pub risk: RiskThresholds,
    pub cluster: ClusterThresholds,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            username_similarity_threshold: 0.6,
            metadata_match_threshold: 0.4,
            temporal_confidence: 70.0,
            risk: RiskThresholds::default(),
            high_impact_privacy_threshold: 3.0,
            high_impact_escalation_count: 3,
            large_cluster_size: 4,
            cluster: ClusterThresholds::default(),
        }
    }
}

impl CorrelationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        let risk = &self.risk;
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !(in_range(risk.high) && in_range(risk.medium) && in_range(risk.low)) {
            return Err(ConfigError::Threshold {
                name: "risk",
                reason: "risk thresholds must lie within 0..=100".to_string(),
            });
        }
        if !(risk.high > risk.medium && risk.medium > risk.low) {
            return Err(ConfigError::Threshold {
                name: "risk",
                reason: format!(
                    "must be strictly descending (high {} > medium {} > low {})",
                    risk.high, risk.medium, risk.low
                ),
            });
        }

        let cluster = &self.cluster;
        if !(cluster.high_strength > cluster.medium_strength
            && cluster.medium_strength > cluster.low_strength)
        {
            return Err(ConfigError::Threshold {
                name: "cluster",
                reason: "strength thresholds must be strictly descending".to_string(),
            });
        }

        for (name, value) in [
            ("username_similarity_threshold", self.username_similarity_threshold),
            ("metadata_match_threshold", self.metadata_match_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Threshold {
                    name,
                    reason: format!("{} outside (0, 1]", value),
                });
            }
        }

        if !in_range(self.temporal_confidence) {
            return Err(ConfigError::Threshold {
                name: "temporal_confidence",
                reason: format!("{} outside 0..=100", self.temporal_confidence),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FootprintConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.politeness.max_requests_per_minute, 30);
        assert_eq!(config.correlation.risk.medium, 50.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            [politeness]
            max_requests_per_minute = 10

            [correlation.risk]
            high = 90.0
        "#;

        let config = FootprintConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.politeness.max_requests_per_minute, 10);
        assert_eq!(config.politeness.max_requests_per_hour, 500);
        assert_eq!(config.correlation.risk.high, 90.0);
        assert_eq!(config.correlation.risk.low, 30.0);
        assert_eq!(config.discovery.platforms.len(), default_platforms().len());
    }

    #[test]
    fn test_weight_out_of_range() {
        let mut config = FootprintConfig::default();
        config.correlation.weights.name_matching = 1.5;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightOutOfRange { name: "name_matching", .. })
        ));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = FootprintConfig::default();
        config.correlation.weights.residual = 0.0;

        assert!(matches!(config.validate(), Err(ConfigError::WeightSum(_))));
    }

    #[test]
    fn test_risk_thresholds_descending() {
        let mut config = FootprintConfig::default();
        config.correlation.risk.medium = 85.0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Threshold { name: "risk", .. })
        ));
    }

    #[test]
    fn test_platform_template_required() {
        let mut config = FootprintConfig::default();
        config
            .discovery
            .platforms
            .push(PlatformSpec::new("broken", &["https://broken.example/profile"], 40.0));

        assert!(matches!(config.validate(), Err(ConfigError::Platform { .. })));

        config.discovery.platforms.last_mut().unwrap().enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_politeness_validation() {
        let mut config = FootprintConfig::default();
        config.politeness.max_requests_per_hour = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Politeness { .. })));

        let mut config = FootprintConfig::default();
        config.politeness.user_agent = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Politeness { name: "user_agent", .. })
        ));
    }

    #[test]
    fn test_to_toml_roundtrip_keeps_weights() {
        let config = FootprintConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed = FootprintConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}

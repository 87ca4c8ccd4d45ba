//! Correlation output types
//!
//! A correlation run produces a batch of [`CorrelationResult`]s, clusters
//! derived from them, and an overall risk verdict. All of it is read-only
//! once produced and is recomputed from scratch whenever the input changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Profile;

/// The signal that produced a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    UsernameSimilarity,
    NameMatching,
    MetadataMatching,
    TemporalPattern,
}

impl CorrelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationType::UsernameSimilarity => "username_similarity",
            CorrelationType::NameMatching => "name_matching",
            CorrelationType::MetadataMatching => "metadata_matching",
            CorrelationType::TemporalPattern => "temporal_pattern",
        }
    }
}

/// One piece of evidence linking profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation_type: CorrelationType,
    /// Two platforms for pairwise signals, one for single-profile matches,
    /// any number for temporal buckets
    pub platforms: Vec<String>,
    /// Confidence score (0.0 - 100.0)
    pub confidence_score: f64,
    pub evidence: Value,
    /// How much this evidence increases identifiability
    pub privacy_impact: f64,
}

impl CorrelationResult {
    /// True when this correlation links exactly two platforms
    pub fn is_pairwise(&self) -> bool {
        self.platforms.len() == 2
    }
}

/// Privacy risk tier, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Fewer than two profiles: nothing to correlate
    InsufficientData,
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Raise the level by one tier; `High` and `InsufficientData` are fixed points
    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::InsufficientData => RiskLevel::InsufficientData,
            RiskLevel::Minimal => RiskLevel::Low,
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium | RiskLevel::High => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::InsufficientData => "insufficient_data",
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative bucket for the overall correlation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthCategory {
    Minimal,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl StrengthCategory {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            StrengthCategory::VeryHigh
        } else if score > 60.0 {
            StrengthCategory::High
        } else if score > 40.0 {
            StrengthCategory::Medium
        } else if score > 20.0 {
            StrengthCategory::Low
        } else {
            StrengthCategory::Minimal
        }
    }
}

/// How often an indicator appears inside a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCount {
    pub count: usize,
    pub percentage: f64,
}

/// Attributes shared by the profiles of a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonAttributes {
    pub platforms: Vec<String>,
    pub data_types: Vec<String>,
    pub common_indicators: BTreeMap<String, IndicatorCount>,
    /// Inferred-data fields holding the same value on every member
    pub shared_patterns: Vec<String>,
}

/// A connected group of correlated profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCluster {
    pub platforms: Vec<String>,
    pub profiles: Vec<Profile>,
    pub correlation_strength: f64,
    pub common_attributes: CommonAttributes,
    pub risk_assessment: RiskLevel,
}

impl ProfileCluster {
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub profiles_analyzed: usize,
    pub correlations_found: usize,
    pub clusters_identified: usize,
}

/// Full output of a correlation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub correlations: Vec<CorrelationResult>,
    pub profile_clusters: Vec<ProfileCluster>,
    /// Weighted average confidence across all correlations (0.0 - 100.0)
    pub overall_correlation_score: f64,
    pub correlation_strength: StrengthCategory,
    pub privacy_risk_assessment: RiskLevel,
    pub recommendations: Vec<String>,
    pub analysis_metadata: AnalysisMetadata,
}

impl CorrelationReport {
    /// Well-formed report for runs with fewer than two profiles
    pub fn insufficient(profiles_analyzed: usize) -> Self {
        Self {
            correlations: Vec::new(),
            profile_clusters: Vec::new(),
            overall_correlation_score: 0.0,
            correlation_strength: StrengthCategory::Minimal,
            privacy_risk_assessment: RiskLevel::InsufficientData,
            recommendations: vec!["Insufficient profiles for correlation analysis".to_string()],
            analysis_metadata: AnalysisMetadata {
                profiles_analyzed,
                ..Default::default()
            },
        }
    }
}

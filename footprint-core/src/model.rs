//! Provenance and profile records
//!
//! Every fetch attempt leaves exactly one [`DataSource`] behind. Successful
//! fetches produce a [`CollectedRecord`]; successful profile probes produce a
//! [`SocialProfileCandidate`], which is turned into a [`Profile`] before
//! correlation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{classifier, Sensitivity};

/// Where a piece of data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Structured payload from a public API
    PublicApi,
    /// Markup page fetched from the public web
    PublicWebpage,
    /// Fetch attempt refused by policy
    Blocked,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::PublicApi => "public_api",
            SourceType::PublicWebpage => "public_webpage",
            SourceType::Blocked => "blocked",
        }
    }

    /// Access level implied by the source type
    pub fn access_level(&self) -> &'static str {
        match self {
            SourceType::PublicApi | SourceType::PublicWebpage => "public",
            SourceType::Blocked => "restricted",
        }
    }

    /// Public-vs-blocked status as decided by the classifier
    pub fn classification(&self) -> DataClassification {
        if classifier::is_public(self.as_str(), self.access_level()) {
            DataClassification::Public
        } else {
            DataClassification::Blocked
        }
    }
}

/// How the data was accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    Api,
    Scraping,
    Blocked,
}

/// Classification of a provenance entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataClassification {
    Public,
    Blocked,
    Unknown,
}

/// Provenance record, one per fetch attempt. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: Uuid,
    pub source_type: SourceType,
    pub url: String,
    pub platform: String,
    /// Caller-declared kind of data being collected (e.g. "profile_probe")
    pub data_type: String,
    pub access_method: AccessMethod,
    pub timestamp: DateTime<Utc>,
    pub robots_compliant: bool,
    pub rate_limited: bool,
    pub data_classification: DataClassification,
    pub legal_basis: String,
}

impl DataSource {
    /// Provenance for a successful public fetch
    pub fn public(url: &str, platform: &str, data_type: &str, source_type: SourceType) -> Self {
        let access_method = match source_type {
            SourceType::PublicApi => AccessMethod::Api,
            SourceType::PublicWebpage => AccessMethod::Scraping,
            SourceType::Blocked => AccessMethod::Blocked,
        };

        Self {
            id: Uuid::new_v4(),
            source_type,
            url: url.to_string(),
            platform: platform.to_string(),
            data_type: data_type.to_string(),
            access_method,
            timestamp: Utc::now(),
            robots_compliant: true,
            rate_limited: true,
            data_classification: source_type.classification(),
            legal_basis: "legitimate_interest_public_data".to_string(),
        }
    }

    /// Provenance for an attempt refused by policy (`reason` e.g. "robots_txt_blocked")
    pub fn blocked(url: &str, platform: &str, data_type: &str, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_type: SourceType::Blocked,
            url: url.to_string(),
            platform: platform.to_string(),
            data_type: data_type.to_string(),
            access_method: AccessMethod::Blocked,
            timestamp: Utc::now(),
            robots_compliant: reason != "robots_txt_blocked",
            rate_limited: true,
            data_classification: SourceType::Blocked.classification(),
            legal_basis: format!("blocked_{}", reason),
        }
    }

    pub fn is_public(&self) -> bool {
        self.data_classification == DataClassification::Public
    }
}

/// Filtered result of a compliant fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedRecord {
    pub url: String,
    pub platform: String,
    pub source_type: SourceType,
    /// Allow-listed fields that survived classification
    pub fields: Map<String, Value>,
    /// Sensitivity tier of every kept field
    pub sensitivity: BTreeMap<String, Sensitivity>,
    pub collected_at: DateTime<Utc>,
}

impl CollectedRecord {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Account state reported by an existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Private,
    Suspended,
}

/// A profile that a probe found to exist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialProfileCandidate {
    pub platform: String,
    pub url: String,
    pub username: String,
    /// Confidence score (0.0 - 100.0)
    pub confidence_score: f64,
    pub discovery_method: String,
    pub profile_data: Map<String, Value>,
    pub verification_status: VerificationStatus,
}

impl SocialProfileCandidate {
    /// URL key used for deduplication: case-folded, trailing slash stripped
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Case-fold a URL and strip trailing slashes
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// A profile as seen by the correlator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub platform: String,
    pub url: String,
    /// Username hint when known from discovery
    pub username: Option<String>,
    /// Coarse content category (professional, social_media, ...)
    pub data_type: String,
    pub indicators: BTreeMap<String, bool>,
    pub inferred_data: BTreeMap<String, Value>,
    pub privacy_score_impact: f64,
    pub confidence_level: f64,
    /// Account creation timestamp when a public source exposes it
    pub created_at: Option<String>,
}

impl Profile {
    pub fn new(platform: &str, url: &str) -> Self {
        Self {
            platform: platform.to_string(),
            url: url.to_string(),
            username: None,
            data_type: "generic_web_presence".to_string(),
            indicators: BTreeMap::new(),
            inferred_data: BTreeMap::new(),
            privacy_score_impact: 0.0,
            confidence_level: 0.0,
            created_at: None,
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.data_type = data_type.to_string();
        self
    }

    pub fn with_indicator(mut self, key: &str, value: bool) -> Self {
        self.indicators.insert(key.to_string(), value);
        self
    }

    pub fn with_inferred(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inferred_data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_created_at(mut self, created_at: &str) -> Self {
        self.created_at = Some(created_at.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_source() {
        let source = DataSource::public(
            "https://github.com/jdoe",
            "github",
            "profile_probe",
            SourceType::PublicWebpage,
        );

        assert!(source.is_public());
        assert!(source.robots_compliant);
        assert_eq!(source.access_method, AccessMethod::Scraping);
    }

    #[test]
    fn test_blocked_source() {
        let source = DataSource::blocked("https://example.com/x", "generic", "probe", "robots_txt_blocked");

        assert!(!source.is_public());
        assert!(!source.robots_compliant);
        assert_eq!(source.legal_basis, "blocked_robots_txt_blocked");
        assert_eq!(source.data_classification, DataClassification::Blocked);
    }

    #[test]
    fn test_classification_follows_classifier() {
        assert_eq!(SourceType::PublicApi.classification(), DataClassification::Public);
        assert_eq!(SourceType::PublicWebpage.classification(), DataClassification::Public);
        assert_eq!(SourceType::Blocked.classification(), DataClassification::Blocked);

        let api = DataSource::public(
            "https://api.github.com/users/jdoe",
            "github",
            "known_profile",
            SourceType::PublicApi,
        );
        assert_eq!(api.data_classification, DataClassification::Public);
        assert_eq!(api.access_method, AccessMethod::Api);

        let blocked = DataSource::blocked("https://example.com/x", "generic", "probe", "rate_limited");
        assert_eq!(blocked.data_classification, DataClassification::Blocked);
        assert!(blocked.robots_compliant);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://GitHub.com/JDoe/"), "https://github.com/jdoe");
        assert_eq!(normalize_url("https://github.com/jdoe"), "https://github.com/jdoe");
    }

    #[test]
    fn test_source_type_serializes_snake_case() {
        let json = serde_json::to_string(&SourceType::PublicApi).unwrap();
        assert_eq!(json, "\"public_api\"");
        assert_eq!(SourceType::Blocked.as_str(), "blocked");
    }
}

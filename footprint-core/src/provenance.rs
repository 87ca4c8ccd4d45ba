//! Provenance log - append-only record of every fetch attempt
//!
//! The store is the only durable artifact of a run. It is shared by every
//! worker of the fetcher, so implementations must be internally synchronized.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{normalize_url, DataSource};

/// Pluggable append-only store for provenance records
pub trait ProvenanceStore: Send + Sync {
    /// Append a record
    fn record(&self, source: DataSource);

    /// Snapshot of all records in insertion order
    fn all(&self) -> Vec<DataSource>;

    /// Number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether some public record exists for this URL
    fn has_public_source(&self, url: &str) -> bool {
        let wanted = normalize_url(url);
        self.all()
            .iter()
            .any(|s| s.is_public() && normalize_url(&s.url) == wanted)
    }
}

/// In-memory provenance log
#[derive(Debug, Default)]
pub struct InMemoryProvenance {
    sources: RwLock<Vec<DataSource>>,
}

impl InMemoryProvenance {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProvenanceStore for InMemoryProvenance {
    fn record(&self, source: DataSource) {
        self.sources.write().push(source);
    }

    fn all(&self) -> Vec<DataSource> {
        self.sources.read().clone()
    }

    fn len(&self) -> usize {
        self.sources.read().len()
    }

    fn has_public_source(&self, url: &str) -> bool {
        let wanted = normalize_url(url);
        self.sources
            .read()
            .iter()
            .any(|s| s.is_public() && normalize_url(&s.url) == wanted)
    }
}

/// A provenance entry as listed per platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub source_type: String,
    pub compliant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub robots_compliant: usize,
    pub rate_limited: usize,
    pub public_only: usize,
}

/// Attribution report consumed by external audit tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionReport {
    pub report_generated: DateTime<Utc>,
    pub total_sources: usize,
    pub sources_by_platform: BTreeMap<String, Vec<SourceReference>>,
    pub sources_by_type: BTreeMap<String, usize>,
    pub compliance_summary: ComplianceSummary,
    pub legal_basis: Vec<String>,
}

impl AttributionReport {
    pub fn from_sources(sources: &[DataSource]) -> Self {
        let mut sources_by_platform: BTreeMap<String, Vec<SourceReference>> = BTreeMap::new();
        let mut sources_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut legal_basis = BTreeSet::new();
        let mut compliance_summary = ComplianceSummary::default();

        for source in sources {
            sources_by_platform
                .entry(source.platform.clone())
                .or_default()
                .push(SourceReference {
                    url: source.url.clone(),
                    timestamp: source.timestamp,
                    source_type: source.source_type.as_str().to_string(),
                    compliant: source.robots_compliant,
                });
            *sources_by_type
                .entry(source.source_type.as_str().to_string())
                .or_default() += 1;
            legal_basis.insert(source.legal_basis.clone());

            if source.robots_compliant {
                compliance_summary.robots_compliant += 1;
            }
            if source.rate_limited {
                compliance_summary.rate_limited += 1;
            }
            if source.is_public() {
                compliance_summary.public_only += 1;
            }
        }

        Self {
            report_generated: Utc::now(),
            total_sources: sources.len(),
            sources_by_platform,
            sources_by_type,
            compliance_summary,
            legal_basis: legal_basis.into_iter().collect(),
        }
    }

    pub fn from_store(store: &dyn ProvenanceStore) -> Self {
        Self::from_sources(&store.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceType;

    #[test]
    fn test_store_append_and_lookup() {
        let store = InMemoryProvenance::new();
        assert!(store.is_empty());

        store.record(DataSource::public(
            "https://github.com/jdoe",
            "github",
            "profile_probe",
            SourceType::PublicWebpage,
        ));
        store.record(DataSource::blocked(
            "https://www.linkedin.com/in/jdoe",
            "linkedin",
            "profile_probe",
            "robots_txt_blocked",
        ));

        assert_eq!(store.len(), 2);
        assert!(store.has_public_source("https://GitHub.com/jdoe/"));
        assert!(!store.has_public_source("https://www.linkedin.com/in/jdoe"));
    }

    #[test]
    fn test_attribution_report() {
        let store = InMemoryProvenance::new();
        store.record(DataSource::public(
            "https://api.github.com/users/jdoe",
            "github",
            "known_profile",
            SourceType::PublicApi,
        ));
        store.record(DataSource::public(
            "https://github.com/jdoe",
            "github",
            "profile_probe",
            SourceType::PublicWebpage,
        ));
        store.record(DataSource::blocked(
            "https://www.linkedin.com/in/jdoe",
            "linkedin",
            "profile_probe",
            "robots_txt_blocked",
        ));

        let report = AttributionReport::from_store(&store);

        assert_eq!(report.total_sources, 3);
        assert_eq!(report.sources_by_platform["github"].len(), 2);
        assert_eq!(report.sources_by_type["blocked"], 1);
        assert_eq!(report.sources_by_type["public_api"], 1);
        assert_eq!(report.compliance_summary.robots_compliant, 2);
        assert_eq!(report.compliance_summary.public_only, 2);
        assert_eq!(report.compliance_summary.rate_limited, 3);
        assert_eq!(report.legal_basis.len(), 2);
    }
}

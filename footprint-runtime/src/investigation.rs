//! Investigation Coordinator
//!
//! Runs one self-audit end to end:
//! - Validates configuration before any client exists
//! - Discovers candidate profiles under a runtime budget
//! - Collects user-supplied profiles through the same fetcher
//! - Correlates everything that is traceable to a public source

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use footprint_analysis::{
    profile_from_candidate, CrossPlatformCorrelator, ProfileCollector, ProfileDiscoveryEngine,
};
use footprint_core::{
    normalize_url, AttributionReport, CorrelationReport, DataSource, FootprintConfig, Profile,
    ProvenanceStore, SocialProfileCandidate,
};
use footprint_net::{CompliantFetcher, SharedFetcher};

/// Seeds for one investigation
#[derive(Debug, Clone, Default)]
pub struct InvestigationRequest {
    pub name_variants: Vec<String>,
    pub email: Option<String>,
    /// Profile URLs the subject already knows about
    pub known_profiles: Vec<String>,
    /// Discovery budget in seconds (0 = unlimited)
    pub max_runtime_secs: u64,
}

/// Everything an investigation produced
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub candidates: Vec<SocialProfileCandidate>,
    pub profiles: Vec<Profile>,
    pub correlation: CorrelationReport,
    pub attribution: AttributionReport,
    pub data_sources: Vec<DataSource>,
}

pub struct Investigation {
    config: FootprintConfig,
    fetcher: SharedFetcher,
    provenance: Arc<dyn ProvenanceStore>,
}

impl Investigation {
    /// Validate the configuration and build the shared compliant fetcher
    pub fn new(config: FootprintConfig) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;

        let fetcher = CompliantFetcher::new(config.politeness.clone())
            .context("Failed to build HTTP client")?;
        let provenance = fetcher.provenance();

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            provenance,
        })
    }

    /// Use a caller-supplied fetcher that records into `provenance`
    pub fn with_fetcher(
        config: FootprintConfig,
        fetcher: SharedFetcher,
        provenance: Arc<dyn ProvenanceStore>,
    ) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self {
            config,
            fetcher,
            provenance,
        })
    }

    /// Run discovery, collection and correlation
    pub async fn run(&self, request: &InvestigationRequest) -> anyhow::Result<InvestigationReport> {
        let has_names = request.name_variants.iter().any(|n| !n.trim().is_empty());
        if !has_names && request.email.is_none() && request.known_profiles.is_empty() {
            bail!("At least one name variant, email address or known profile is required");
        }

        let started_at = Utc::now();
        let email = request.email.as_deref();

        let discovered = self.discover(request).await;
        let candidates: Vec<SocialProfileCandidate> = discovered
            .into_iter()
            .filter(|c| {
                let traceable = self.provenance.has_public_source(&c.url);
                if !traceable {
                    warn!("Dropping {}: no public source recorded", c.url);
                }
                traceable
            })
            .collect();

        let collector = ProfileCollector::new(
            self.fetcher.clone(),
            self.config.discovery.max_concurrent_probes,
        );
        let mut profiles = collector.collect(&request.known_profiles).await;

        for candidate in &candidates {
            let known = profiles
                .iter()
                .any(|p| normalize_url(&p.url) == candidate.normalized_url());
            if !known {
                profiles.push(profile_from_candidate(candidate));
            }
        }

        let correlator = CrossPlatformCorrelator::new(self.config.correlation.clone());
        let correlation = correlator.correlate(&profiles, &request.name_variants, email);

        info!(
            "Investigation finished: {} candidates, {} profiles, risk {}",
            candidates.len(),
            profiles.len(),
            correlation.privacy_risk_assessment
        );

        Ok(InvestigationReport {
            started_at,
            finished_at: Utc::now(),
            candidates,
            profiles,
            correlation,
            attribution: AttributionReport::from_store(self.provenance.as_ref()),
            data_sources: self.provenance.all(),
        })
    }

    async fn discover(&self, request: &InvestigationRequest) -> Vec<SocialProfileCandidate> {
        let cancel = CancellationToken::new();
        let engine = ProfileDiscoveryEngine::new(self.fetcher.clone(), self.config.discovery.clone())
            .with_cancellation(cancel.clone());

        // Budget watchdog: stops new probes, in-flight ones finish or time out
        let watchdog = (request.max_runtime_secs > 0).then(|| {
            let budget = Duration::from_secs(request.max_runtime_secs);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                warn!("Discovery reached maximum runtime of {:?}", budget);
                cancel.cancel();
            })
        });

        let found = engine
            .discover(&request.name_variants, request.email.as_deref())
            .await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use footprint_core::{InMemoryProvenance, PlatformSpec, SourceType};
    use footprint_net::{FetchOutcome, FetchedPage, PageFetcher};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory web that records provenance for tracked pages only
    struct MockWeb {
        pages: HashMap<String, String>,
        untracked: Vec<String>,
        provenance: Arc<InMemoryProvenance>,
        delay: Option<Duration>,
        requests: AtomicUsize,
    }

    impl MockWeb {
        fn new(provenance: Arc<InMemoryProvenance>, pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                untracked: Vec::new(),
                provenance,
                delay: None,
                requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for MockWeb {
        async fn fetch_page(&self, url: &str, data_type: &str, platform: &str) -> FetchOutcome {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let Some(body) = self.pages.get(url) else {
                return FetchOutcome::NotFound("HTTP 404".to_string());
            };

            if !self.untracked.iter().any(|u| u == url) {
                self.provenance.record(DataSource::public(
                    url,
                    platform,
                    data_type,
                    SourceType::PublicWebpage,
                ));
            }

            FetchOutcome::Fetched(FetchedPage {
                status: 200,
                requested_url: url.to_string(),
                final_url: url.to_string(),
                content_type: Some("text/html".to_string()),
                body: body.clone(),
                record: None,
            })
        }
    }

    fn config() -> FootprintConfig {
        let mut config = FootprintConfig::default();
        config.discovery.platforms = vec![
            PlatformSpec::new("alpha", &["https://alpha.example/{username}"], 80.0),
            PlatformSpec::new("beta", &["https://beta.example/{username}"], 70.0),
        ];
        config.discovery.max_candidates = Some(1);
        config
    }

    fn request() -> InvestigationRequest {
        InvestigationRequest {
            name_variants: vec!["jdoe".to_string()],
            known_profiles: vec!["https://gamma.example/jdoe".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = FootprintConfig::default();
        config.correlation.weights.username_similarity = 0.9;

        let err = Investigation::new(config).err().unwrap();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let provenance = Arc::new(InMemoryProvenance::new());
        let web = Arc::new(MockWeb::new(provenance.clone(), &[]));
        let investigation = Investigation::with_fetcher(config(), web, provenance).unwrap();

        let request = InvestigationRequest {
            name_variants: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(investigation.run(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_run_keeps_only_traceable_candidates() {
        let provenance = Arc::new(InMemoryProvenance::new());
        let mut web = MockWeb::new(
            provenance.clone(),
            &[
                ("https://alpha.example/jdoe", "Profile of jdoe"),
                ("https://beta.example/jdoe", "Profile of jdoe"),
            ],
        );
        web.untracked.push("https://beta.example/jdoe".to_string());

        let investigation =
            Investigation::with_fetcher(config(), Arc::new(web), provenance).unwrap();
        let report = investigation.run(&request()).await.unwrap();

        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].platform, "alpha");

        // Known gamma profile is unreachable but kept with inferred traits
        assert_eq!(report.profiles.len(), 2);
        assert_eq!(report.profiles[0].url, "https://gamma.example/jdoe");

        assert_eq!(report.correlation.profile_clusters.len(), 1);
        assert_eq!(report.data_sources.len(), 1);
        assert_eq!(report.attribution.total_sources, 1);
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_budget_stops_new_probes() {
        let provenance = Arc::new(InMemoryProvenance::new());
        let mut web = MockWeb::new(provenance.clone(), &[]);
        web.delay = Some(Duration::from_secs(60));
        let web = Arc::new(web);

        let mut config = config();
        config.discovery.max_candidates = None;
        let concurrency = config.discovery.max_concurrent_probes;

        let investigation =
            Investigation::with_fetcher(config, web.clone(), provenance).unwrap();
        let request = InvestigationRequest {
            max_runtime_secs: 1,
            known_profiles: Vec::new(),
            ..request()
        };
        let report = investigation.run(&request).await.unwrap();

        assert!(report.candidates.is_empty());
        assert_eq!(web.requests.load(Ordering::SeqCst), concurrency);
    }
}

//! Profile discovery engine
//!
//! Probes every candidate against every enabled platform template through a
//! shared [`PageFetcher`]. Probes run on a bounded pool and complete in any
//! order; results are deduplicated and ranked only once the pool drains.

use footprint_core::{DiscoveryConfig, PlatformSpec, SocialProfileCandidate};
use footprint_net::{FetchOutcome, SharedFetcher};
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    confidence_score, email_local_part, generate_candidates, name_match_strength, ExistenceRule,
    ResponseMetadata,
};

/// Data type declared on every probe fetch
pub const PROBE_DATA_TYPE: &str = "profile_probe";

const DISCOVERY_METHOD: &str = "automated_discovery";

/// Email local parts shorter than this are not used for name matching
const MIN_LOCAL_PART_LEN: usize = 3;

/// One candidate x platform x template combination
#[derive(Debug, Clone)]
struct Probe {
    username: String,
    platform: String,
    url: String,
    reliability: f64,
}

pub struct ProfileDiscoveryEngine {
    fetcher: SharedFetcher,
    config: DiscoveryConfig,
    cancel: CancellationToken,
}

impl ProfileDiscoveryEngine {
    pub fn new(fetcher: SharedFetcher, config: DiscoveryConfig) -> Self {
        Self {
            fetcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with the caller
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Generate candidates from the seeds and probe them, highest confidence first
    pub async fn discover(
        &self,
        name_variants: &[String],
        email: Option<&str>,
    ) -> Vec<SocialProfileCandidate> {
        let candidates = generate_candidates(name_variants, email, &self.config);
        info!(
            "Generated {} username candidates from {} name variants",
            candidates.len(),
            name_variants.len()
        );

        let mut name_seeds = name_variants.to_vec();
        if let Some(local) = email.and_then(email_local_part) {
            if local.chars().count() >= MIN_LOCAL_PART_LEN {
                name_seeds.push(local);
            }
        }

        self.discover_candidates(&candidates, &name_seeds).await
    }

    /// Probe pre-generated candidates
    pub async fn discover_candidates(
        &self,
        candidates: &[String],
        name_variants: &[String],
    ) -> Vec<SocialProfileCandidate> {
        let probes = self.plan_probes(candidates);
        let concurrency = self.config.max_concurrent_probes.max(1);
        info!(
            "Probing {} URLs with up to {} concurrent probes",
            probes.len(),
            concurrency
        );

        let found: Vec<SocialProfileCandidate> = stream::iter(probes)
            .take_until(self.cancel.cancelled())
            .map(|probe| self.probe(probe, name_variants))
            .buffer_unordered(concurrency)
            .filter_map(|candidate| async move { candidate })
            .collect()
            .await;

        if self.cancel.is_cancelled() {
            warn!("Discovery cancelled, keeping {} completed probes", found.len());
        }

        let ranked = rank_candidates(found);
        info!("Discovery finished with {} profiles", ranked.len());
        ranked
    }

    fn plan_probes(&self, candidates: &[String]) -> Vec<Probe> {
        let platforms: Vec<&PlatformSpec> = self.config.enabled_platforms().collect();

        candidates
            .iter()
            .flat_map(|username| {
                platforms.iter().flat_map(move |platform| {
                    platform.build_urls(username).into_iter().map(move |url| Probe {
                        username: username.clone(),
                        platform: platform.name.clone(),
                        url,
                        reliability: platform.reliability,
                    })
                })
            })
            .collect()
    }

    async fn probe(&self, probe: Probe, name_variants: &[String]) -> Option<SocialProfileCandidate> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let fetch = self
            .fetcher
            .fetch_page(&probe.url, PROBE_DATA_TYPE, &probe.platform);
        let outcome = match tokio::time::timeout(self.config.probe_timeout(), fetch).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Probe of {} timed out", probe.url);
                return None;
            }
        };

        let page = match outcome {
            FetchOutcome::Fetched(page) => page,
            other => {
                debug!("No profile at {} ({})", probe.url, other.label());
                return None;
            }
        };

        let verdict = ExistenceRule::for_platform(&probe.platform)
            .evaluate(&ResponseMetadata::from_page(&page));
        if !verdict.exists {
            debug!("{} responded but shows no profile", probe.url);
            return None;
        }

        let name_match = name_match_strength(&probe.username, name_variants);
        let confidence = confidence_score(probe.reliability, name_match, &verdict);

        let mut profile_data = Map::new();
        if let Some(record) = &page.record {
            profile_data.extend(record.fields.clone());
        }
        profile_data.insert("status_code".to_string(), json!(page.status));
        profile_data.insert("url".to_string(), Value::String(page.final_url.clone()));
        profile_data.insert("has_activity".to_string(), json!(verdict.has_activity));
        profile_data.insert("name_match_strength".to_string(), json!(name_match));

        info!(
            "Discovered {} profile {} (confidence {:.1})",
            probe.platform, probe.url, confidence
        );

        Some(SocialProfileCandidate {
            platform: probe.platform,
            url: probe.url,
            username: probe.username,
            confidence_score: confidence,
            discovery_method: DISCOVERY_METHOD.to_string(),
            profile_data,
            verification_status: verdict.status,
        })
    }
}

/// Deduplicate by normalized URL, keeping the highest confidence, then sort
/// by confidence descending with the URL as tie-breaker
pub fn rank_candidates(found: Vec<SocialProfileCandidate>) -> Vec<SocialProfileCandidate> {
    let mut best: HashMap<String, SocialProfileCandidate> = HashMap::new();

    for candidate in found {
        match best.entry(candidate.normalized_url()) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                let better = candidate.confidence_score > current.confidence_score
                    || (candidate.confidence_score == current.confidence_score
                        && candidate.url < current.url);
                if better {
                    slot.insert(candidate);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
        }
    }

    let mut ranked: Vec<SocialProfileCandidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.url.cmp(&b.url))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use footprint_core::VerificationStatus;
    use footprint_net::{FetchedPage, PageFetcher};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    /// Serves canned bodies by URL; everything else is a 404
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl MockFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch_page(&self, url: &str, _data_type: &str, _platform: &str) -> FetchOutcome {
            self.requested.lock().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.pages.get(url) {
                Some(body) => FetchOutcome::Fetched(FetchedPage {
                    status: 200,
                    requested_url: url.to_string(),
                    final_url: url.to_string(),
                    content_type: Some("text/html".to_string()),
                    body: body.clone(),
                    record: None,
                }),
                None => FetchOutcome::NotFound("HTTP 404".to_string()),
            }
        }
    }

    fn config(platforms: Vec<PlatformSpec>) -> DiscoveryConfig {
        DiscoveryConfig {
            platforms,
            max_concurrent_probes: 2,
            ..Default::default()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(url: &str, confidence: f64) -> SocialProfileCandidate {
        SocialProfileCandidate {
            platform: "github".to_string(),
            url: url.to_string(),
            username: "jdoe".to_string(),
            confidence_score: confidence,
            discovery_method: DISCOVERY_METHOD.to_string(),
            profile_data: Map::new(),
            verification_status: VerificationStatus::Unverified,
        }
    }

    #[tokio::test]
    async fn test_discovers_existing_profiles() {
        let fetcher = MockFetcher::default()
            .with_page("https://github.com/jdoe", "<h2>Repositories</h2>")
            .with_page("https://example.org/u/jdoe", "nothing to see");
        let platforms = vec![
            PlatformSpec::new("github", &["https://github.com/{username}"], 90.0),
            PlatformSpec::new("example", &["https://example.org/u/{username}"], 50.0),
        ];

        let engine = ProfileDiscoveryEngine::new(Arc::new(fetcher), config(platforms));
        let found = engine
            .discover_candidates(&names(&["jdoe", "john.doe"]), &names(&["jdoe"]))
            .await;

        assert_eq!(found.len(), 1);
        let profile = &found[0];
        assert_eq!(profile.platform, "github");
        // 0.6 * 90 + 0.4 * 100 + 10 activity bonus, clamped
        assert_eq!(profile.confidence_score, 100.0);
        assert_eq!(profile.profile_data["status_code"], json!(200));
        assert_eq!(profile.profile_data["has_activity"], json!(true));
        assert_eq!(profile.discovery_method, "automated_discovery");
    }

    #[tokio::test]
    async fn test_probes_every_template() {
        let fetcher = Arc::new(MockFetcher::default());
        let platforms = vec![PlatformSpec::new(
            "twitter",
            &["https://twitter.com/{username}", "https://x.com/{username}"],
            75.0,
        )];

        let engine = ProfileDiscoveryEngine::new(fetcher.clone(), config(platforms));
        let found = engine.discover_candidates(&names(&["a1", "b2"]), &[]).await;

        assert!(found.is_empty());
        assert_eq!(fetcher.requested.lock().len(), 4);
    }

    #[tokio::test]
    async fn test_disabled_platforms_skipped() {
        let fetcher = Arc::new(MockFetcher::default());
        let mut disabled = PlatformSpec::new("github", &["https://github.com/{username}"], 90.0);
        disabled.enabled = false;

        let engine = ProfileDiscoveryEngine::new(fetcher.clone(), config(vec![disabled]));
        engine.discover_candidates(&names(&["jdoe"]), &[]).await;

        assert!(fetcher.requested.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_issues_no_probes() {
        let fetcher = Arc::new(MockFetcher::default().with_page("https://github.com/jdoe", "repositories"));
        let platforms = vec![PlatformSpec::new("github", &["https://github.com/{username}"], 90.0)];

        let engine = ProfileDiscoveryEngine::new(fetcher.clone(), config(platforms));
        engine.cancellation_token().cancel();

        let found = engine.discover_candidates(&names(&["jdoe"]), &[]).await;
        assert!(found.is_empty());
        assert!(fetcher.requested.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_drops_result() {
        let fetcher = MockFetcher {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        }
        .with_page("https://github.com/jdoe", "repositories");
        let platforms = vec![PlatformSpec::new("github", &["https://github.com/{username}"], 90.0)];
        let config = DiscoveryConfig {
            probe_timeout_secs: 5,
            ..config(platforms)
        };

        let engine = ProfileDiscoveryEngine::new(Arc::new(fetcher), config);
        let found = engine.discover_candidates(&names(&["jdoe"]), &[]).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_discover_uses_email_local_part() {
        let fetcher = MockFetcher::default().with_page("https://github.com/jdoe99", "repositories");
        let platforms = vec![PlatformSpec::new("github", &["https://github.com/{username}"], 90.0)];

        let engine = ProfileDiscoveryEngine::new(Arc::new(fetcher), config(platforms));
        let found = engine.discover(&[], Some("jdoe99@example.com")).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "jdoe99");
        assert_eq!(found[0].profile_data["name_match_strength"], json!(100.0));
    }

    #[test]
    fn test_rank_dedups_by_normalized_url() {
        let ranked = rank_candidates(vec![
            candidate("https://github.com/jdoe", 60.0),
            candidate("https://GitHub.com/jdoe/", 80.0),
            candidate("https://x.com/jdoe", 90.0),
        ]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "https://x.com/jdoe");
        assert_eq!(ranked[1].confidence_score, 80.0);
    }

    #[test]
    fn test_rank_is_order_independent() {
        let a = candidate("https://a.example/jdoe", 70.0);
        let b = candidate("https://b.example/jdoe", 70.0);
        let c = candidate("https://A.example/jdoe/", 70.0);

        let first: Vec<String> = rank_candidates(vec![a.clone(), b.clone(), c.clone()])
            .into_iter()
            .map(|c| c.url)
            .collect();
        let second: Vec<String> = rank_candidates(vec![c, b, a])
            .into_iter()
            .map(|c| c.url)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}

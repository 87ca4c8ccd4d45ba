//! Cross-platform correlation
//!
//! Four independent signals produce [`CorrelationResult`]s. Pairwise results
//! become edges of an undirected platform graph whose connected components
//! are the profile clusters. Scores are confidence averages weighted by
//! signal type, renormalized over the results actually present.

use footprint_core::{
    AnalysisMetadata, CommonAttributes, CorrelationConfig, CorrelationReport, CorrelationResult,
    CorrelationType, IndicatorCount, Profile, ProfileCluster, RiskLevel, StrengthCategory,
};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::{email_local_part, extract_username, username_similarity};

static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})").unwrap());

/// Inferred-data fields compared by the metadata signal
const COMPARABLE_FIELDS: &[&str] = &[
    "employment_status",
    "communication_style",
    "technical_expertise",
    "content_type",
    "social_network_type",
];

const EXACT_NAME_CONFIDENCE: f64 = 0.9;
const PARTIAL_NAME_CONFIDENCE: f64 = 0.6;
const MIN_NAME_TOKEN_LEN: usize = 3;

const USERNAME_IMPACT: f64 = 3.0;
const NAME_IMPACT: f64 = 2.5;
const METADATA_IMPACT: f64 = 2.0;
const TEMPORAL_IMPACT: f64 = 1.5;

/// Score thresholds used by the recommendation rules
const HIGH_CORRELATION_SCORE: f64 = 70.0;
const MEDIUM_CORRELATION_SCORE: f64 = 50.0;
const HYGIENE_SCORE: f64 = 30.0;

const HYGIENE_RECOMMENDATIONS: &[&str] = &[
    "Use different profile pictures across platforms",
    "Avoid cross-posting identical content",
    "Stagger account creation times for future profiles",
    "Consider using different email addresses for different platforms",
];

/// Undirected platform graph over an arena of node indices
#[derive(Debug, Default)]
struct PlatformGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<BTreeSet<usize>>,
}

impl PlatformGraph {
    fn from_correlations(correlations: &[CorrelationResult]) -> Self {
        let mut graph = Self::default();
        for correlation in correlations.iter().filter(|c| c.is_pairwise()) {
            let a = graph.node(&correlation.platforms[0]);
            let b = graph.node(&correlation.platforms[1]);
            if a != b {
                graph.edges[a].insert(b);
                graph.edges[b].insert(a);
            }
        }
        graph
    }

    fn node(&mut self, platform: &str) -> usize {
        if let Some(&id) = self.index.get(platform) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(platform.to_string());
        self.index.insert(platform.to_string(), id);
        self.edges.push(BTreeSet::new());
        id
    }

    /// Connected components, each as a sorted list of platform names
    fn components(&self) -> Vec<Vec<String>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            let mut stack = vec![start];
            let mut members = Vec::new();
            while let Some(node) = stack.pop() {
                members.push(self.nodes[node].clone());
                for &next in &self.edges[node] {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            members.sort();
            components.push(members);
        }

        components
    }
}

pub struct CrossPlatformCorrelator {
    config: CorrelationConfig,
}

impl Default for CrossPlatformCorrelator {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

impl CrossPlatformCorrelator {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Correlate profiles into clusters and a risk verdict
    pub fn correlate(
        &self,
        profiles: &[Profile],
        name_variants: &[String],
        email: Option<&str>,
    ) -> CorrelationReport {
        if profiles.len() < 2 {
            info!("Skipping correlation: {} profile(s) supplied", profiles.len());
            return CorrelationReport::insufficient(profiles.len());
        }

        let mut names: Vec<String> = name_variants
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        if let Some(local) = email.and_then(email_local_part) {
            if local.chars().count() >= MIN_NAME_TOKEN_LEN && !names.contains(&local) {
                names.push(local);
            }
        }

        let mut correlations = self.username_correlations(profiles);
        correlations.extend(self.name_correlations(profiles, &names));
        correlations.extend(self.metadata_correlations(profiles));
        correlations.extend(self.temporal_correlations(profiles));

        let clusters = self.build_clusters(profiles, &correlations);
        let overall = self.overall_score(&correlations);
        let risk = self.assess_privacy_risk(overall, &correlations, &clusters);
        let recommendations = self.recommendations(overall, &correlations, &clusters);

        info!(
            "Correlated {} profiles: {} correlations, {} clusters, score {:.1}, risk {}",
            profiles.len(),
            correlations.len(),
            clusters.len(),
            overall,
            risk
        );

        CorrelationReport {
            analysis_metadata: AnalysisMetadata {
                profiles_analyzed: profiles.len(),
                correlations_found: correlations.len(),
                clusters_identified: clusters.len(),
            },
            correlations,
            profile_clusters: clusters,
            overall_correlation_score: overall,
            correlation_strength: StrengthCategory::from_score(overall),
            privacy_risk_assessment: risk,
            recommendations,
        }
    }

    /// Signal 1: similar handles on two profiles
    pub fn username_correlations(&self, profiles: &[Profile]) -> Vec<CorrelationResult> {
        let usernames: Vec<Option<String>> = profiles.iter().map(profile_username).collect();
        let mut correlations = Vec::new();

        for i in 0..profiles.len() {
            for j in (i + 1)..profiles.len() {
                let (Some(first), Some(second)) = (&usernames[i], &usernames[j]) else {
                    continue;
                };

                let similarity = username_similarity(first, second);
                if similarity <= self.config.username_similarity_threshold {
                    continue;
                }

                debug!("Username {} ~ {} ({:.2})", first, second, similarity);
                correlations.push(CorrelationResult {
                    correlation_type: CorrelationType::UsernameSimilarity,
                    platforms: vec![profiles[i].platform.clone(), profiles[j].platform.clone()],
                    confidence_score: similarity * 100.0,
                    evidence: json!({
                        "username1": first,
                        "username2": second,
                        "similarity_score": similarity,
                        "comparison_method": "string_similarity",
                    }),
                    privacy_impact: USERNAME_IMPACT * similarity,
                });
            }
        }

        correlations
    }

    /// Signal 2: a name variant, or one of its tokens, inside a profile URL
    pub fn name_correlations(&self, profiles: &[Profile], names: &[String]) -> Vec<CorrelationResult> {
        let mut correlations = Vec::new();

        for profile in profiles {
            let url = profile.url.to_lowercase();
            let mut matches = Vec::new();

            for name in names {
                let name = name.to_lowercase();
                let (match_type, confidence) = if url.contains(&name) {
                    ("exact", EXACT_NAME_CONFIDENCE)
                } else if name
                    .split_whitespace()
                    .any(|token| token.chars().count() >= MIN_NAME_TOKEN_LEN && url.contains(token))
                {
                    ("partial", PARTIAL_NAME_CONFIDENCE)
                } else {
                    continue;
                };
                matches.push((name, match_type, confidence));
            }

            if matches.is_empty() {
                continue;
            }

            let average = matches.iter().map(|m| m.2).sum::<f64>() / matches.len() as f64;
            let found: Vec<Value> = matches
                .iter()
                .map(|(name, match_type, confidence)| {
                    json!({ "variant": name, "match_type": match_type, "confidence": confidence })
                })
                .collect();

            correlations.push(CorrelationResult {
                correlation_type: CorrelationType::NameMatching,
                platforms: vec![profile.platform.clone()],
                confidence_score: average * 100.0,
                evidence: json!({
                    "matches_found": found,
                    "profile_url": profile.url,
                    "match_count": matches.len(),
                }),
                privacy_impact: NAME_IMPACT * average,
            });
        }

        correlations
    }

    /// Signal 3: agreement on comparable inferred fields
    pub fn metadata_correlations(&self, profiles: &[Profile]) -> Vec<CorrelationResult> {
        let mut correlations = Vec::new();

        for i in 0..profiles.len() {
            for j in (i + 1)..profiles.len() {
                let (first, second) = (&profiles[i], &profiles[j]);
                let mut compared = 0usize;
                let mut matched = Vec::new();

                for field in COMPARABLE_FIELDS {
                    let (Some(a), Some(b)) =
                        (first.inferred_data.get(*field), second.inferred_data.get(*field))
                    else {
                        continue;
                    };
                    compared += 1;
                    if a == b {
                        matched.push(json!({ "field": field, "value": a }));
                    }
                }

                if compared == 0 {
                    continue;
                }
                let score = matched.len() as f64 / compared as f64;
                if score <= self.config.metadata_match_threshold {
                    continue;
                }

                correlations.push(CorrelationResult {
                    correlation_type: CorrelationType::MetadataMatching,
                    platforms: vec![first.platform.clone(), second.platform.clone()],
                    confidence_score: score * 100.0,
                    evidence: json!({
                        "match_score": score,
                        "matched_attributes": matched,
                        "total_comparisons": compared,
                    }),
                    privacy_impact: METADATA_IMPACT * score,
                });
            }
        }

        correlations
    }

    /// Signal 4: accounts created in the same year
    pub fn temporal_correlations(&self, profiles: &[Profile]) -> Vec<CorrelationResult> {
        let mut buckets: BTreeMap<String, Vec<(&Profile, &str)>> = BTreeMap::new();

        for profile in profiles {
            let Some(created) = creation_date(profile) else {
                continue;
            };
            if let Some(year) = YEAR_PATTERN.captures(created).and_then(|c| c.get(1)) {
                buckets
                    .entry(year.as_str().to_string())
                    .or_default()
                    .push((profile, created));
            }
        }

        buckets
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(year, members)| CorrelationResult {
                correlation_type: CorrelationType::TemporalPattern,
                platforms: members.iter().map(|(p, _)| p.platform.clone()).collect(),
                confidence_score: self.config.temporal_confidence,
                evidence: json!({
                    "cluster_size": members.len(),
                    "year": year,
                    "creation_dates": members.iter().map(|(_, d)| *d).collect::<Vec<_>>(),
                }),
                privacy_impact: TEMPORAL_IMPACT,
            })
            .collect()
    }

    /// Connected components of the platform graph with at least two platforms
    pub fn build_clusters(
        &self,
        profiles: &[Profile],
        correlations: &[CorrelationResult],
    ) -> Vec<ProfileCluster> {
        PlatformGraph::from_correlations(correlations)
            .components()
            .into_iter()
            .filter(|platforms| platforms.len() >= 2)
            .map(|platforms| {
                let members: Vec<Profile> = profiles
                    .iter()
                    .filter(|p| platforms.contains(&p.platform))
                    .cloned()
                    .collect();

                let strength = self.cluster_strength(&platforms, correlations);
                let risk = self.cluster_risk(strength, members.len());

                ProfileCluster {
                    common_attributes: common_attributes(&members),
                    platforms,
                    profiles: members,
                    correlation_strength: strength,
                    risk_assessment: risk,
                }
            })
            .collect()
    }

    /// Weighted average confidence of correlations lying entirely inside `platforms`
    pub fn cluster_strength(&self, platforms: &[String], correlations: &[CorrelationResult]) -> f64 {
        weighted_average(
            correlations
                .iter()
                .filter(|c| c.platforms.iter().all(|p| platforms.contains(p)))
                .map(|c| (c.confidence_score, self.weight(c.correlation_type))),
        )
    }

    pub fn cluster_risk(&self, strength: f64, profile_count: usize) -> RiskLevel {
        let t = &self.config.cluster;
        if strength > t.high_strength && profile_count >= t.high_members {
            RiskLevel::High
        } else if strength > t.medium_strength && profile_count >= t.medium_members {
            RiskLevel::Medium
        } else if strength > t.low_strength {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    /// Weighted average confidence over all correlations (0.0 - 100.0)
    pub fn overall_score(&self, correlations: &[CorrelationResult]) -> f64 {
        weighted_average(
            correlations
                .iter()
                .map(|c| (c.confidence_score, self.weight(c.correlation_type))),
        )
    }

    /// Base risk from the score, escalated for high-impact evidence and large clusters
    pub fn assess_privacy_risk(
        &self,
        overall_score: f64,
        correlations: &[CorrelationResult],
        clusters: &[ProfileCluster],
    ) -> RiskLevel {
        let t = &self.config.risk;
        let mut risk = if overall_score > t.high {
            RiskLevel::High
        } else if overall_score > t.medium {
            RiskLevel::Medium
        } else if overall_score > t.low {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        };

        let high_impact = correlations
            .iter()
            .filter(|c| c.privacy_impact > self.config.high_impact_privacy_threshold)
            .count();
        if high_impact >= self.config.high_impact_escalation_count {
            debug!("{} high-impact correlations, escalating {}", high_impact, risk);
            risk = risk.escalate();
        }

        if clusters
            .iter()
            .any(|c| c.profile_count() >= self.config.large_cluster_size)
        {
            debug!("Large cluster present, escalating {}", risk);
            risk = risk.escalate();
        }

        risk
    }

    pub fn recommendations(
        &self,
        overall_score: f64,
        correlations: &[CorrelationResult],
        clusters: &[ProfileCluster],
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if overall_score > HIGH_CORRELATION_SCORE {
            recommendations.push(
                "HIGH CORRELATION DETECTED: Your profiles are highly correlated across platforms. \
                 Consider using different usernames and limiting shared information."
                    .to_string(),
            );
        } else if overall_score > MEDIUM_CORRELATION_SCORE {
            recommendations.push(
                "MEDIUM CORRELATION: Some patterns link your profiles. \
                 Review username choices and profile information consistency."
                    .to_string(),
            );
        }

        let count_of = |kind: CorrelationType| {
            correlations
                .iter()
                .filter(|c| c.correlation_type == kind)
                .count()
        };

        if count_of(CorrelationType::UsernameSimilarity) >= 2 {
            recommendations.push(
                "Use different usernames across platforms to reduce cross-platform linking."
                    .to_string(),
            );
        }

        if count_of(CorrelationType::NameMatching) >= 3 {
            recommendations.push(
                "Your real name appears in multiple profile URLs. \
                 Consider using pseudonyms or handles instead."
                    .to_string(),
            );
        }

        if let Some(cluster) = clusters.iter().find(|c| c.risk_assessment == RiskLevel::High) {
            recommendations.push(format!(
                "HIGHLY CORRELATED CLUSTER: Profiles on {} are strongly linked. \
                 Consider compartmentalizing your online presence.",
                cluster.platforms.join(", ")
            ));
        }

        if overall_score > HYGIENE_SCORE {
            recommendations.extend(HYGIENE_RECOMMENDATIONS.iter().map(|r| r.to_string()));
        }

        recommendations
    }

    fn weight(&self, kind: CorrelationType) -> f64 {
        let w = &self.config.weights;
        match kind {
            CorrelationType::UsernameSimilarity => w.username_similarity,
            CorrelationType::NameMatching => w.name_matching,
            CorrelationType::MetadataMatching => w.metadata_matching,
            CorrelationType::TemporalPattern => w.temporal_pattern,
        }
    }
}

fn profile_username(profile: &Profile) -> Option<String> {
    extract_username(&profile.url).or_else(|| profile.username.clone())
}

fn creation_date(profile: &Profile) -> Option<&str> {
    profile
        .created_at
        .as_deref()
        .or_else(|| profile.inferred_data.get("account_created").and_then(Value::as_str))
}

fn weighted_average(scores: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (total, weights) = scores.fold((0.0, 0.0), |(total, weights), (score, weight)| {
        (total + score * weight, weights + weight)
    });
    if weights > 0.0 {
        total / weights
    } else {
        0.0
    }
}

fn common_attributes(members: &[Profile]) -> CommonAttributes {
    let data_types: BTreeSet<String> = members.iter().map(|p| p.data_type.clone()).collect();

    let mut indicator_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for profile in members {
        for (key, _) in profile.indicators.iter().filter(|(_, set)| **set) {
            *indicator_counts.entry(key.as_str()).or_default() += 1;
        }
    }

    let total = members.len().max(1);
    let common_indicators = indicator_counts
        .into_iter()
        .filter(|(_, count)| *count >= 2 || *count as f64 / total as f64 >= 0.5)
        .map(|(key, count)| {
            (
                key.to_string(),
                IndicatorCount {
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                },
            )
        })
        .collect();

    let shared_patterns = match members.split_first() {
        Some((first, rest)) if !rest.is_empty() => first
            .inferred_data
            .iter()
            .filter(|(key, value)| rest.iter().all(|p| p.inferred_data.get(*key) == Some(*value)))
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{}={}", key, text),
                None => format!("{}={}", key, value),
            })
            .collect(),
        _ => Vec::new(),
    };

    CommonAttributes {
        platforms: members.iter().map(|p| p.platform.clone()).collect(),
        data_types: data_types.into_iter().collect(),
        common_indicators,
        shared_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer_profile;

    fn correlator() -> CrossPlatformCorrelator {
        CrossPlatformCorrelator::default()
    }

    fn result(kind: CorrelationType, platforms: &[&str], confidence: f64, impact: f64) -> CorrelationResult {
        CorrelationResult {
            correlation_type: kind,
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
            confidence_score: confidence,
            evidence: Value::Null,
            privacy_impact: impact,
        }
    }

    fn cluster_of(size: usize) -> ProfileCluster {
        let profiles: Vec<Profile> = (0..size)
            .map(|i| Profile::new(&format!("p{}", i), &format!("https://p{}.example/jdoe", i)))
            .collect();
        ProfileCluster {
            platforms: profiles.iter().map(|p| p.platform.clone()).collect(),
            common_attributes: common_attributes(&profiles),
            profiles,
            correlation_strength: 50.0,
            risk_assessment: RiskLevel::Low,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fewer_than_two_profiles() {
        let c = correlator();
        for profiles in [vec![], vec![infer_profile("github", "https://github.com/jdoe")]] {
            let report = c.correlate(&profiles, &names(&["John Doe"]), None);
            assert!(report.correlations.is_empty());
            assert!(report.profile_clusters.is_empty());
            assert_eq!(report.overall_correlation_score, 0.0);
            assert_eq!(report.privacy_risk_assessment, RiskLevel::InsufficientData);
        }
    }

    #[test]
    fn test_identical_usernames_cluster() {
        let profiles = vec![
            infer_profile("github", "https://github.com/jdoe"),
            infer_profile("twitter", "https://twitter.com/jdoe"),
        ];

        let report = correlator().correlate(&profiles, &[], None);

        let username: Vec<_> = report
            .correlations
            .iter()
            .filter(|c| c.correlation_type == CorrelationType::UsernameSimilarity)
            .collect();
        assert_eq!(username.len(), 1);
        assert!(username[0].confidence_score >= 90.0);

        assert_eq!(report.profile_clusters.len(), 1);
        let cluster = &report.profile_clusters[0];
        assert_eq!(cluster.platforms, vec!["github", "twitter"]);
        assert_eq!(cluster.profile_count(), 2);
        assert_eq!(cluster.risk_assessment, RiskLevel::Low);

        assert_eq!(report.privacy_risk_assessment, RiskLevel::High);
        assert_eq!(report.correlation_strength, StrengthCategory::VeryHigh);
        assert_eq!(report.analysis_metadata.clusters_identified, 1);
    }

    #[test]
    fn test_dissimilar_usernames_not_linked() {
        let profiles = vec![
            infer_profile("github", "https://github.com/jdoe"),
            infer_profile("twitter", "https://twitter.com/qwerty42"),
        ];

        let report = correlator().correlate(&profiles, &[], None);
        assert!(report.correlations.is_empty());
        assert!(report.profile_clusters.is_empty());
        assert_eq!(report.privacy_risk_assessment, RiskLevel::Minimal);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_base_risk_mapping() {
        let c = correlator();
        assert_eq!(c.assess_privacy_risk(85.0, &[], &[]), RiskLevel::High);
        assert_eq!(c.assess_privacy_risk(65.0, &[], &[]), RiskLevel::Medium);
        assert_eq!(c.assess_privacy_risk(35.0, &[], &[]), RiskLevel::Low);
        assert_eq!(c.assess_privacy_risk(20.0, &[], &[]), RiskLevel::Minimal);
    }

    #[test]
    fn test_high_impact_escalation() {
        let c = correlator();
        let impactful: Vec<CorrelationResult> = (0..3)
            .map(|_| result(CorrelationType::UsernameSimilarity, &["a", "b"], 55.0, 3.5))
            .collect();

        assert_eq!(c.assess_privacy_risk(55.0, &impactful, &[]), RiskLevel::High);
        assert_eq!(c.assess_privacy_risk(55.0, &impactful[..2], &[]), RiskLevel::Medium);
        // Impact must exceed the threshold, not equal it
        let borderline: Vec<CorrelationResult> = (0..3)
            .map(|_| result(CorrelationType::UsernameSimilarity, &["a", "b"], 55.0, 3.0))
            .collect();
        assert_eq!(c.assess_privacy_risk(55.0, &borderline, &[]), RiskLevel::Medium);
    }

    #[test]
    fn test_large_cluster_escalation() {
        let c = correlator();
        assert_eq!(c.assess_privacy_risk(35.0, &[], &[cluster_of(4)]), RiskLevel::Low.escalate());
        assert_eq!(c.assess_privacy_risk(35.0, &[], &[cluster_of(3)]), RiskLevel::Low);
    }

    #[test]
    fn test_name_matching() {
        let profiles = vec![
            infer_profile("github", "https://github.com/johndoe"),
            infer_profile("twitter", "https://twitter.com/doe_fan"),
            infer_profile("reddit", "https://www.reddit.com/user/xyz"),
        ];

        let results = correlator().name_correlations(&profiles, &names(&["johndoe", "john doe"]));

        assert_eq!(results.len(), 2);
        // exact "johndoe" plus partial via "john"
        assert_eq!(results[0].platforms, vec!["github"]);
        assert!((results[0].confidence_score - 75.0).abs() < 1e-9);
        // partial via "doe"
        assert_eq!(results[1].platforms, vec!["twitter"]);
        assert!((results[1].confidence_score - 60.0).abs() < 1e-9);
        assert!((results[1].privacy_impact - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_metadata_matching() {
        let github = infer_profile("github", "https://github.com/a1");
        let gitlab = Profile::new("gitlab", "https://gitlab.com/b2")
            .with_inferred("technical_expertise", "demonstrated");
        let twitter = infer_profile("twitter", "https://twitter.com/c3");

        let results = correlator().metadata_correlations(&[github, gitlab, twitter]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].platforms, vec!["github", "gitlab"]);
        assert_eq!(results[0].confidence_score, 100.0);
        assert_eq!(results[0].privacy_impact, 2.0);
    }

    #[test]
    fn test_temporal_buckets() {
        let profiles = vec![
            Profile::new("github", "https://github.com/a1").with_created_at("2011-03-02T10:00:00Z"),
            Profile::new("twitter", "https://twitter.com/b2").with_inferred("account_created", "June 2011"),
            Profile::new("reddit", "https://reddit.com/user/c3").with_created_at("2015-01-01"),
            Profile::new("medium", "https://medium.com/@d4"),
        ];

        let results = correlator().temporal_correlations(&profiles);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].platforms, vec!["github", "twitter"]);
        assert_eq!(results[0].confidence_score, 70.0);
        assert_eq!(results[0].evidence["year"], json!("2011"));
    }

    #[test]
    fn test_cluster_strength_is_weighted() {
        let c = correlator();
        let correlations = vec![
            result(CorrelationType::UsernameSimilarity, &["github", "twitter"], 100.0, 3.0),
            result(CorrelationType::TemporalPattern, &["github", "twitter"], 70.0, 1.5),
            result(CorrelationType::NameMatching, &["reddit"], 90.0, 2.25),
        ];
        let platforms = names(&["github", "twitter"]);

        // (100 * 0.30 + 70 * 0.15) / 0.45
        assert!((c.cluster_strength(&platforms, &correlations) - 90.0).abs() < 1e-9);
        assert_eq!(c.cluster_strength(&names(&["medium"]), &correlations), 0.0);
    }

    #[test]
    fn test_connected_components() {
        let correlations = vec![
            result(CorrelationType::UsernameSimilarity, &["a", "b"], 80.0, 2.4),
            result(CorrelationType::UsernameSimilarity, &["c", "b"], 80.0, 2.4),
            result(CorrelationType::UsernameSimilarity, &["d", "e"], 80.0, 2.4),
            result(CorrelationType::UsernameSimilarity, &["f", "f"], 80.0, 2.4),
            result(CorrelationType::NameMatching, &["g"], 90.0, 2.25),
        ];

        let components = PlatformGraph::from_correlations(&correlations).components();
        assert_eq!(
            components,
            vec![names(&["a", "b", "c"]), names(&["d", "e"]), names(&["f"])]
        );
    }

    #[test]
    fn test_common_attributes() {
        let members = vec![
            infer_profile("github", "https://github.com/jdoe"),
            Profile::new("gitlab", "https://gitlab.com/jdoe")
                .with_indicator("coding_activity", true)
                .with_indicator("web_presence", false)
                .with_inferred("technical_expertise", "demonstrated"),
        ];

        let attributes = common_attributes(&members);

        assert_eq!(attributes.platforms, vec!["github", "gitlab"]);
        assert_eq!(
            attributes.data_types,
            vec!["generic_web_presence", "professional_technical"]
        );
        let coding = &attributes.common_indicators["coding_activity"];
        assert_eq!(coding.count, 2);
        assert_eq!(coding.percentage, 100.0);
        // One of two profiles still reaches the 50% bar
        assert_eq!(attributes.common_indicators["technical_skills"].count, 1);
        assert!(!attributes.common_indicators.contains_key("web_presence"));
        assert_eq!(attributes.shared_patterns, vec!["technical_expertise=demonstrated"]);
    }

    #[test]
    fn test_recommendations() {
        let c = correlator();
        let correlations = vec![
            result(CorrelationType::UsernameSimilarity, &["a", "b"], 90.0, 2.7),
            result(CorrelationType::UsernameSimilarity, &["b", "c"], 90.0, 2.7),
        ];
        let mut high = cluster_of(4);
        high.risk_assessment = RiskLevel::High;

        let recommendations = c.recommendations(90.0, &correlations, &[high]);

        assert!(recommendations[0].starts_with("HIGH CORRELATION DETECTED"));
        assert!(recommendations.iter().any(|r| r.starts_with("Use different usernames")));
        assert!(recommendations
            .iter()
            .any(|r| r.contains("Profiles on p0, p1, p2, p3 are strongly linked")));
        assert_eq!(recommendations.len(), 3 + HYGIENE_RECOMMENDATIONS.len());

        let medium = c.recommendations(55.0, &[], &[]);
        assert!(medium[0].starts_with("MEDIUM CORRELATION"));
        assert!(c.recommendations(25.0, &[], &[]).is_empty());
    }

    #[test]
    fn test_email_local_part_counts_as_name() {
        let profiles = vec![
            infer_profile("github", "https://github.com/jdoe99"),
            infer_profile("twitter", "https://twitter.com/someone"),
        ];

        let report = correlator().correlate(&profiles, &[], Some("jdoe99@example.com"));
        let names: Vec<_> = report
            .correlations
            .iter()
            .filter(|c| c.correlation_type == CorrelationType::NameMatching)
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].platforms, vec!["github"]);
    }
}

//! Known-profile collection
//!
//! Turns user-supplied profile URLs into correlator [`Profile`]s. Each URL
//! is cleaned, attributed to a platform and fetched once through the shared
//! fetcher; public fields from the response are merged into the profile's
//! inferred data.

use footprint_core::{infer_platform, CollectedRecord, Profile};
use footprint_net::{FetchOutcome, FetchedPage, SharedFetcher};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::{extract_username, infer_profile};

/// Data type declared on collection fetches
pub const COLLECTION_DATA_TYPE: &str = "profile_collection";

/// Query parameters stripped from user-supplied URLs
const TRACKING_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "fbclid", "gclid"];

/// Numeric API fields copied verbatim
const COUNT_FIELDS: &[&str] = &["public_repos", "followers", "following"];

/// Normalize a user-supplied profile URL
pub fn clean_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&kept);
    }

    Some(url.to_string())
}

pub struct ProfileCollector {
    fetcher: SharedFetcher,
    max_concurrent: usize,
}

impl ProfileCollector {
    pub fn new(fetcher: SharedFetcher, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Collect every URL, preserving input order. Robots-blocked URLs are excluded.
    pub async fn collect(&self, urls: &[String]) -> Vec<Profile> {
        let profiles: Vec<Profile> = stream::iter(urls)
            .map(|raw| self.collect_one(raw))
            .buffered(self.max_concurrent)
            .filter_map(|profile| async move { profile })
            .collect()
            .await;

        info!("Collected {} of {} known profiles", profiles.len(), urls.len());
        profiles
    }

    async fn collect_one(&self, raw: &str) -> Option<Profile> {
        let Some(url) = clean_url(raw) else {
            warn!("Skipping invalid profile URL {:?}", raw);
            return None;
        };

        let platform = infer_platform(&url);
        let username = extract_username(&url);

        let mut profile = infer_profile(platform, &url);
        if let Some(username) = &username {
            profile = profile.with_username(username);
        }

        // GitHub exposes public profile fields through its users API
        let fetch_url = match (platform, &username) {
            ("github", Some(username)) => format!("https://api.github.com/users/{}", username),
            _ => url.clone(),
        };

        let accessibility = match self
            .fetcher
            .fetch_page(&fetch_url, COLLECTION_DATA_TYPE, platform)
            .await
        {
            FetchOutcome::Fetched(page) => {
                merge_page(&mut profile, &page);
                "public"
            }
            FetchOutcome::RobotsBlocked => {
                info!("Excluding {}: disallowed by robots.txt", url);
                return None;
            }
            other => {
                debug!("Keeping {} with inferred traits only ({})", url, other.label());
                "unreachable"
            }
        };

        Some(profile.with_inferred("accessibility", accessibility))
    }
}

fn merge_page(profile: &mut Profile, page: &FetchedPage) {
    match &page.record {
        Some(record) => merge_record(profile, record),
        None => debug!("No public fields extracted from {}", page.final_url),
    }
}

fn merge_record(profile: &mut Profile, record: &CollectedRecord) {
    let inferred = &mut profile.inferred_data;

    for key in COUNT_FIELDS {
        if let Some(value) = record.fields.get(*key).filter(|v| v.is_number()) {
            inferred.insert(key.to_string(), value.clone());
        }
    }

    if let Some(created) = record.get_str("created_at") {
        inferred.insert("account_created".to_string(), Value::from(created));
        profile.created_at = Some(created.to_string());
    }

    if record.fields.contains_key("company") {
        inferred.insert("company_provided".to_string(), Value::Bool(true));
    }

    if let Some(title) = record.get_str("title") {
        inferred.insert("page_title".to_string(), Value::from(title));
    }
    if let Some(description) = record.get_str("description") {
        inferred.insert("description".to_string(), Value::from(description));
    }
}

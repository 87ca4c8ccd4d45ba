//! Platform registry
//!
//! Known social platforms with their profile URL templates and a static
//! reliability base score used for confidence scoring.

use serde::{Deserialize, Serialize};

use crate::UNKNOWN_PLATFORM_RELIABILITY;

/// Placeholder replaced by the candidate username in URL templates
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// A platform that can be probed for profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Platform identifier (github, twitter, ...)
    pub name: String,
    /// URL templates with a {username} placeholder
    pub url_templates: Vec<String>,
    /// Static reliability base score (0.0 - 100.0)
    pub reliability: f64,
    /// Whether discovery probes this platform
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PlatformSpec {
    pub fn new(name: &str, url_templates: &[&str], reliability: f64) -> Self {
        Self {
            name: name.to_string(),
            url_templates: url_templates.iter().map(|t| t.to_string()).collect(),
            reliability,
            enabled: true,
        }
    }

    /// Build every profile URL for a username
    pub fn build_urls(&self, username: &str) -> Vec<String> {
        self.url_templates
            .iter()
            .map(|template| template.replace(USERNAME_PLACEHOLDER, username))
            .collect()
    }
}

/// Default platform table
pub fn default_platforms() -> Vec<PlatformSpec> {
    vec![
        PlatformSpec::new("github", &["https://github.com/{username}"], 90.0),
        PlatformSpec::new("linkedin", &["https://www.linkedin.com/in/{username}"], 85.0),
        PlatformSpec::new("youtube", &["https://www.youtube.com/@{username}"], 80.0),
        PlatformSpec::new(
            "twitter",
            &["https://twitter.com/{username}", "https://x.com/{username}"],
            75.0,
        ),
        PlatformSpec::new("medium", &["https://medium.com/@{username}"], 75.0),
        PlatformSpec::new("instagram", &["https://www.instagram.com/{username}"], 70.0),
        PlatformSpec::new("facebook", &["https://www.facebook.com/{username}"], 65.0),
        PlatformSpec::new("reddit", &["https://www.reddit.com/user/{username}"], 60.0),
        PlatformSpec::new("tiktok", &["https://www.tiktok.com/@{username}"], 50.0),
        PlatformSpec::new("pinterest", &["https://www.pinterest.com/{username}"], 50.0),
    ]
}

/// Reliability base score for a platform, falling back for unknown ones
pub fn reliability_of(platforms: &[PlatformSpec], name: &str) -> f64 {
    platforms
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.reliability)
        .unwrap_or(UNKNOWN_PLATFORM_RELIABILITY)
}

/// Host part of a URL, lowercased, without port and leading `www.`
pub fn host_of(url: &str) -> Option<String> {
    let rest = url.trim().split_once("://").map(|(_, r)| r).unwrap_or(url.trim());
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        return None;
    }

    let host = host.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

const DOMAIN_PLATFORMS: &[(&str, &str)] = &[
    ("linkedin.com", "linkedin"),
    ("instagram.com", "instagram"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("facebook.com", "facebook"),
    ("github.com", "github"),
    ("youtube.com", "youtube"),
    ("tiktok.com", "tiktok"),
    ("reddit.com", "reddit"),
    ("pinterest.com", "pinterest"),
    ("medium.com", "medium"),
    ("snapchat.com", "snapchat"),
];

/// Infer a platform identifier from a profile URL ("unknown" when unrecognized)
pub fn infer_platform(url: &str) -> &'static str {
    let Some(host) = host_of(url) else {
        return "unknown";
    };

    DOMAIN_PLATFORMS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
        .map(|(_, platform)| *platform)
        .unwrap_or("unknown")
}

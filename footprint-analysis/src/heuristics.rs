//! Profile existence heuristics
//!
//! Each platform maps to a pure rule over response metadata. Rules that
//! reach no decision fall through to the generic keyword check.

use footprint_core::{normalize_url, VerificationStatus};
use footprint_net::FetchedPage;

/// Keywords whose presence suggests a profile page
const GENERIC_PROFILE_MARKERS: &[&str] = &["profile", "user", "posts", "followers"];

/// Keywords that indicate visible account activity
const ACTIVITY_MARKERS: &[&str] = &["repositories", "commits", "posts", "followers", "tweets"];

/// What a probe saw
#[derive(Debug, Clone, Copy)]
pub struct ResponseMetadata<'a> {
    pub status: u16,
    pub requested_url: &'a str,
    pub final_url: &'a str,
    pub body: &'a str,
}

impl<'a> ResponseMetadata<'a> {
    pub fn from_page(page: &'a FetchedPage) -> Self {
        Self {
            status: page.status,
            requested_url: &page.requested_url,
            final_url: &page.final_url,
            body: &page.body,
        }
    }

    fn redirected(&self) -> bool {
        normalize_url(self.requested_url) != normalize_url(self.final_url)
    }
}

/// Outcome of an existence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub exists: bool,
    pub has_activity: bool,
    pub status: VerificationStatus,
}

impl ProbeVerdict {
    fn missing() -> Self {
        Self {
            exists: false,
            has_activity: false,
            status: VerificationStatus::Unverified,
        }
    }

    fn found(content: &str, status: VerificationStatus) -> Self {
        Self {
            exists: true,
            has_activity: contains_any(content, ACTIVITY_MARKERS),
            status,
        }
    }
}

/// Platform-specific existence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceRule {
    Github,
    Twitter,
    Linkedin,
    Instagram,
    Generic,
}

impl ExistenceRule {
    pub fn for_platform(platform: &str) -> Self {
        match platform.to_lowercase().as_str() {
            "github" => ExistenceRule::Github,
            "twitter" | "x" => ExistenceRule::Twitter,
            "linkedin" => ExistenceRule::Linkedin,
            "instagram" => ExistenceRule::Instagram,
            _ => ExistenceRule::Generic,
        }
    }

    pub fn evaluate(&self, meta: &ResponseMetadata<'_>) -> ProbeVerdict {
        if meta.status != 200 {
            return ProbeVerdict::missing();
        }
        let content = meta.body.to_lowercase();

        let decided = match self {
            ExistenceRule::Github => {
                if contains_any(&content, &["page not found", "404"]) {
                    Some(ProbeVerdict::missing())
                } else if contains_any(&content, &["repositories", "commits"]) {
                    Some(ProbeVerdict::found(&content, VerificationStatus::Unverified))
                } else {
                    None
                }
            }
            ExistenceRule::Twitter => {
                if content.contains("this account doesn't exist") {
                    Some(ProbeVerdict::missing())
                } else if content.contains("suspended") {
                    Some(ProbeVerdict {
                        status: VerificationStatus::Suspended,
                        ..ProbeVerdict::missing()
                    })
                } else if contains_any(&content, &["tweets", "following"]) {
                    Some(ProbeVerdict::found(&content, VerificationStatus::Unverified))
                } else {
                    None
                }
            }
            ExistenceRule::Linkedin => {
                if contains_any(&content, &["page not found", "member not found"]) {
                    Some(ProbeVerdict::missing())
                } else if meta.redirected() {
                    // Redirect to a sign-in wall
                    Some(ProbeVerdict::found(&content, VerificationStatus::Private))
                } else {
                    Some(ProbeVerdict::found(&content, VerificationStatus::Unverified))
                }
            }
            ExistenceRule::Instagram => {
                if contains_any(&content, &["page not found", "user not found"]) {
                    Some(ProbeVerdict::missing())
                } else if contains_any(&content, &["posts", "followers"]) {
                    Some(ProbeVerdict::found(&content, VerificationStatus::Unverified))
                } else {
                    None
                }
            }
            ExistenceRule::Generic => None,
        };

        decided.unwrap_or_else(|| generic_verdict(&content))
    }
}

fn generic_verdict(content: &str) -> ProbeVerdict {
    if contains_any(content, GENERIC_PROFILE_MARKERS) {
        ProbeVerdict::found(content, VerificationStatus::Unverified)
    } else {
        ProbeVerdict::missing()
    }
}

fn contains_any(content: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| content.contains(n))
}

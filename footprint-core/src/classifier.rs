//! Sensitivity classification of collected fields
//!
//! Pure, deterministic keyword tables. Fields classified [`Sensitivity::High`]
//! are never persisted; the tables are checked most-sensitive first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Sensitivity tier of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    High,
    Medium,
    Low,
    Unknown,
}

/// Financial, medical, location and contact terms
const HIGH_SENSITIVITY: &[&str] = &[
    "private_message",
    "private_post",
    "private_photo",
    "contact",
    "location",
    "address",
    "phone",
    "email",
    "financial",
    "bank",
    "credit_card",
    "salary",
    "health",
    "medical",
    "political",
    "religious",
    "birth",
    "ssn",
    "password",
    "secret",
    "token",
    "api_key",
    "private_key",
];

/// Employment, education and social graph terms
const MEDIUM_SENSITIVITY: &[&str] = &[
    "employment",
    "company",
    "organization",
    "education",
    "school",
    "connection",
    "activity_pattern",
    "interest",
    "demographic",
];

/// Public identity and aggregate counts
const LOW_SENSITIVITY: &[&str] = &[
    "username",
    "login",
    "name",
    "bio",
    "title",
    "description",
    "public_post",
    "public_repo",
    "public_activity",
    "follower",
    "following",
    "join_date",
    "created_at",
    "updated_at",
    "avatar",
    "url",
    "blog",
    "type",
];

/// Keywords that make a field or its value sensitive regardless of tier
const SENSITIVE_VALUE_KEYWORDS: &[&str] = &[
    "email",
    "phone",
    "address",
    "private",
    "personal",
    "secret",
    "token",
    "password",
    "api_key",
    "private_key",
];

const PUBLIC_SOURCES: &[&str] = &[
    "public_api",
    "public_webpage",
    "search_engine_results",
    "open_directory",
    "public_registry",
    "published_content",
];

const PUBLIC_ACCESS_LEVELS: &[&str] = &["public", "open", "unrestricted", "search_indexed"];

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

/// Classify a field name into a sensitivity tier.
///
/// `platform` lets professional networks treat employer fields as
/// employment history rather than unknown data.
pub fn classify(field_name: &str, platform: &str) -> Sensitivity {
    let field = field_name.to_lowercase();

    if HIGH_SENSITIVITY.iter().any(|k| field.contains(k)) {
        return Sensitivity::High;
    }

    if MEDIUM_SENSITIVITY.iter().any(|k| field.contains(k)) {
        return Sensitivity::Medium;
    }

    if matches!(platform, "linkedin" | "github") && (field == "hireable" || field == "work") {
        return Sensitivity::Medium;
    }

    if LOW_SENSITIVITY.iter().any(|k| field.contains(k)) {
        return Sensitivity::Low;
    }

    Sensitivity::Unknown
}

/// Whether a source/access-level pair counts as public data
pub fn is_public(source_type: &str, access_level: &str) -> bool {
    PUBLIC_SOURCES.contains(&source_type) || PUBLIC_ACCESS_LEVELS.contains(&access_level)
}

/// Whether a field must be dropped because its name or value looks sensitive
pub fn is_sensitive_value(key: &str, value: &Value) -> bool {
    let key = key.to_lowercase();
    if SENSITIVE_VALUE_KEYWORDS.iter().any(|k| key.contains(k)) {
        return true;
    }

    match value {
        Value::String(text) => {
            let lower = text.to_lowercase();
            SENSITIVE_VALUE_KEYWORDS.iter().any(|k| lower.contains(k)) || EMAIL_REGEX.is_match(text)
        }
        _ => false,
    }
}

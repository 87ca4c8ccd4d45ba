//! Public-field extraction
//!
//! Only an allow-listed set of fields leaves this module. Structured API
//! payloads keep the allow-listed keys; markup pages contribute their title,
//! description and Open Graph metadata.

use footprint_core::{classify, is_sensitive_value, Sensitivity};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::NetError;

/// Keys kept from structured API payloads
pub const API_FIELDS: &[&str] = &[
    "login",
    "name",
    "bio",
    "location",
    "blog",
    "company",
    "public_repos",
    "followers",
    "following",
    "created_at",
    "updated_at",
    "type",
    "site_admin",
    "avatar_url",
    "html_url",
    "repos_url",
    "organizations_url",
];

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Open Graph properties copied into `og_*` fields
const OPEN_GRAPH_PROPERTIES: &[&str] = &["title", "description", "type", "site_name"];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static OPEN_GRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property^="og:"]"#).unwrap());

/// How a response body is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Html,
    Other,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return ContentKind::Html;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if mime == "application/json" || mime.ends_with("+json") {
            ContentKind::Json
        } else if mime == "text/html" || mime == "application/xhtml+xml" || mime == "text/plain" {
            ContentKind::Html
        } else {
            ContentKind::Other
        }
    }
}

/// Allow-listed fields of a JSON object payload
pub fn extract_json_fields(body: &str) -> Result<Map<String, Value>, NetError> {
    let value: Value = serde_json::from_str(body)?;

    let Value::Object(object) = value else {
        return Ok(Map::new());
    };

    Ok(object
        .into_iter()
        .filter(|(key, value)| API_FIELDS.contains(&key.as_str()) && !value.is_null())
        .collect())
}

/// Title, description and Open Graph metadata of a markup page
pub fn extract_html_fields(body: &str) -> Map<String, Value> {
    let document = Html::parse_document(body);
    let mut fields = Map::new();

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        let text = normalize_whitespace(&title.text().collect::<String>());
        if !text.is_empty() {
            fields.insert("title".to_string(), Value::String(truncate(&text, MAX_TITLE_CHARS)));
        }
    }

    if let Some(content) = document
        .select(&DESCRIPTION_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
    {
        let text = normalize_whitespace(content);
        if !text.is_empty() {
            fields.insert(
                "description".to_string(),
                Value::String(truncate(&text, MAX_DESCRIPTION_CHARS)),
            );
        }
    }

    for element in document.select(&OPEN_GRAPH_SELECTOR) {
        let (Some(property), Some(content)) =
            (element.value().attr("property"), element.value().attr("content"))
        else {
            continue;
        };
        let Some(name) = property.strip_prefix("og:") else {
            continue;
        };
        if !OPEN_GRAPH_PROPERTIES.contains(&name) {
            continue;
        }

        let key = format!("og_{}", name);
        if !fields.contains_key(&key) {
            fields.insert(
                key,
                Value::String(truncate(&normalize_whitespace(content), MAX_DESCRIPTION_CHARS)),
            );
        }
    }

    fields
}

/// Drop sensitive values and high-sensitivity fields, tagging the rest
pub fn filter_public_fields(
    fields: Map<String, Value>,
    platform: &str,
) -> (Map<String, Value>, BTreeMap<String, Sensitivity>) {
    let mut kept = Map::new();
    let mut sensitivity = BTreeMap::new();

    for (key, value) in fields {
        if is_sensitive_value(&key, &value) {
            debug!("Dropping sensitive value in field {}", key);
            continue;
        }

        let tier = classify(&key, platform);
        if tier == Sensitivity::High {
            debug!("Dropping high-sensitivity field {}", key);
            continue;
        }

        sensitivity.insert(key.clone(), tier);
        kept.insert(key, value);
    }

    (kept, sensitivity)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

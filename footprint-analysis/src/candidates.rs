//! Username candidate generation
//!
//! Deterministic: the same seeds always yield the same ordered list.
//! Bases come first, then the email local part, then digit and year
//! suffixes, so a `max_candidates` cap keeps the most likely handles.

use footprint_core::DiscoveryConfig;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]{2,30}$").unwrap());

/// Whether a string passes the username charset and length filter
pub fn is_valid_username(candidate: &str) -> bool {
    USERNAME_PATTERN.is_match(candidate)
}

/// Base handles derived from one name variant
pub fn name_transforms(name_variant: &str) -> Vec<String> {
    let lower = name_variant.trim().to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let mut bases = vec![
        tokens.concat(),
        tokens.join("_"),
        tokens.join("-"),
        tokens.join("."),
        tokens.iter().filter_map(|t| t.chars().next()).collect::<String>(),
        first.to_string(),
    ];

    if let Some(last) = tokens.last().filter(|_| tokens.len() > 1) {
        if let Some(initial) = first.chars().next() {
            bases.push(format!("{}{}", initial, last));
        }
    }

    bases
}

/// Local part of an email address, without any `+tag`
pub fn email_local_part(email: &str) -> Option<String> {
    let (local, _) = email.trim().split_once('@')?;
    let local = local.split('+').next().unwrap_or(local).to_lowercase();
    if local.is_empty() {
        None
    } else {
        Some(local)
    }
}

/// Generate ordered, deduplicated username candidates
pub fn generate_candidates(
    name_variants: &[String],
    email: Option<&str>,
    config: &DiscoveryConfig,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut push = |candidate: String, out: &mut Vec<String>| {
        if is_valid_username(&candidate) && seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    };

    let mut bases: Vec<String> = Vec::new();
    for variant in name_variants {
        for base in name_transforms(variant) {
            if base.chars().count() >= 2 && !bases.contains(&base) {
                bases.push(base);
            }
        }
    }

    for base in &bases {
        push(base.clone(), &mut candidates);
    }

    if let Some(local) = email.and_then(email_local_part) {
        push(local, &mut candidates);
    }

    for base in &bases {
        for digit in 0..10 {
            push(format!("{}{}", base, digit), &mut candidates);
        }
    }

    for base in &bases {
        for year in config.year_range_start..=config.year_range_end {
            push(format!("{}{}", base, year), &mut candidates);
        }
    }

    if let Some(max) = config.max_candidates {
        candidates.truncate(max);
    }

    candidates
}

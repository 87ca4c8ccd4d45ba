//! Username extraction and similarity
//!
//! The similarity measure is symmetric by construction: the pair is put in
//! a canonical order before the sequence ratio is computed.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static HANDLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]{1,50}$").unwrap());

/// Path prefixes that precede a handle
const HANDLE_PREFIXES: &[&str] = &["user", "u", "in"];

/// Similarity assigned to handles equal once separators are removed
const SEPARATOR_EQUIVALENCE: f64 = 0.9;
/// Similarity assigned to handles equal once digits are removed
const DIGIT_EQUIVALENCE: f64 = 0.8;

/// Extract the handle from a profile URL.
///
/// Tried in order: the last path segment, an `@handle` segment, and the
/// segment following `/user/`, `/u/` or `/in/`.
pub fn extract_username(profile_url: &str) -> Option<String> {
    let url = Url::parse(profile_url.trim()).ok()?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if let Some(last) = segments.last() {
        if HANDLE_PATTERN.is_match(last) {
            return Some(last.to_string());
        }
    }

    if let Some(handle) = segments.iter().find_map(|seg| seg.strip_prefix('@')) {
        if HANDLE_PATTERN.is_match(handle) {
            return Some(handle.to_string());
        }
    }

    segments
        .windows(2)
        .find(|pair| HANDLE_PREFIXES.contains(&pair[0]) && HANDLE_PATTERN.is_match(pair[1]))
        .map(|pair| pair[1].to_string())
}

/// Ratio of matching characters, 2*M / (|a| + |b|), over non-overlapping
/// longest common blocks
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut matched = 0usize;
    let mut stack = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        let (i, j, k) = longest_match(&a, &b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            stack.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            stack.push((i + k, ahi, j + k, bhi));
        }
    }

    2.0 * matched as f64 / total as f64
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`, earliest on ties
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; width + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                current[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = current;
    }

    best
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '_' | '.' | '-')).collect()
}

fn strip_digits(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_digit()).collect()
}

/// Normalized username similarity in 0.0..=1.0
pub fn username_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let (first, second) = if a <= b { (&a, &b) } else { (&b, &a) };
    let mut similarity = sequence_ratio(first, second);

    if strip_separators(first) == strip_separators(second) {
        similarity = similarity.max(SEPARATOR_EQUIVALENCE);
    }

    let bare_first = strip_digits(first);
    if !bare_first.is_empty() && bare_first == strip_digits(second) {
        similarity = similarity.max(DIGIT_EQUIVALENCE);
    }

    similarity
}

//! Candidate confidence scoring

use footprint_core::{VerificationStatus, MAX_CONFIDENCE, MIN_CONFIDENCE};

use crate::ProbeVerdict;

const RELIABILITY_WEIGHT: f64 = 0.6;
const NAME_MATCH_WEIGHT: f64 = 0.4;
const ACTIVITY_BONUS: f64 = 10.0;
const RESTRICTED_PENALTY: f64 = 20.0;

/// Minimum length of a name token that counts as a partial match
const MIN_TOKEN_LEN: usize = 3;

/// How strongly a candidate username matches the seed names (0, 60, 80 or 100)
pub fn name_match_strength(candidate: &str, name_variants: &[String]) -> f64 {
    let candidate = candidate.to_lowercase();
    let mut best: f64 = 0.0;

    for variant in name_variants {
        let variant = variant.trim().to_lowercase();
        if variant.is_empty() {
            continue;
        }
        if variant == candidate {
            return 100.0;
        }
        if candidate.contains(&variant) {
            best = best.max(80.0);
        }
        if variant
            .split_whitespace()
            .any(|token| token.chars().count() >= MIN_TOKEN_LEN && candidate.contains(token))
        {
            best = best.max(60.0);
        }
    }

    best
}

/// Confidence that a probed profile belongs to the subject, clamped to 0..=100
pub fn confidence_score(reliability: f64, name_match: f64, verdict: &ProbeVerdict) -> f64 {
    let mut score = RELIABILITY_WEIGHT * reliability + NAME_MATCH_WEIGHT * name_match;

    if verdict.has_activity {
        score += ACTIVITY_BONUS;
    }
    if matches!(
        verdict.status,
        VerificationStatus::Private | VerificationStatus::Suspended
    ) {
        score -= RESTRICTED_PENALTY;
    }

    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(has_activity: bool, status: VerificationStatus) -> ProbeVerdict {
        ProbeVerdict {
            exists: true,
            has_activity,
            status,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_match_strength() {
        let variants = names(&["John Doe", "jdoe"]);
        assert_eq!(name_match_strength("JDoe", &variants), 100.0);
        assert_eq!(name_match_strength("jdoe1985", &variants), 80.0);
        assert_eq!(name_match_strength("john_doe", &variants), 60.0);
        assert_eq!(name_match_strength("jd", &variants), 0.0);
        assert_eq!(name_match_strength("jdoe", &[]), 0.0);
    }

    #[test]
    fn test_short_tokens_ignored() {
        assert_eq!(name_match_strength("alexbo", &names(&["Al Bo"])), 0.0);
    }

    #[test]
    fn test_confidence_formula() {
        let plain = verdict(false, VerificationStatus::Unverified);
        assert!((confidence_score(90.0, 100.0, &plain) - 94.0).abs() < 1e-9);
        assert!((confidence_score(50.0, 0.0, &plain) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_penalty_and_clamp() {
        let active = verdict(true, VerificationStatus::Unverified);
        assert_eq!(confidence_score(90.0, 100.0, &active), 100.0);

        let private = verdict(false, VerificationStatus::Private);
        assert!((confidence_score(85.0, 0.0, &private) - 31.0).abs() < 1e-9);

        let suspended = verdict(false, VerificationStatus::Suspended);
        assert_eq!(confidence_score(10.0, 0.0, &suspended), 0.0);
    }
}

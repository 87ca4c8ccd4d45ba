//! Platform trait inference
//!
//! Every profile handed to the correlator carries coarse traits derived from
//! its platform alone. Fetched public fields are merged on top by the
//! collector.

use footprint_core::{Profile, SocialProfileCandidate};
use serde_json::Value;

/// Static traits of one platform family
struct PlatformTraits {
    data_type: &'static str,
    indicators: &'static [&'static str],
    inferred: &'static [(&'static str, &'static str)],
    privacy_score_impact: f64,
    confidence_level: f64,
}

const LINKEDIN: PlatformTraits = PlatformTraits {
    data_type: "professional",
    indicators: &["professional_network", "career_focused", "business_connections"],
    inferred: &[
        ("employment_status", "likely_employed"),
        ("professional_activity", "active"),
        ("industry_engagement", "business_professional"),
        ("networking_behavior", "professional_networking"),
    ],
    privacy_score_impact: -1.5,
    confidence_level: 0.8,
};

const TWITTER: PlatformTraits = PlatformTraits {
    data_type: "social_media",
    indicators: &["social_media_active", "public_opinions", "real_time_updates"],
    inferred: &[
        ("communication_style", "public_social"),
        ("opinion_sharing", "active"),
        ("current_events_engagement", "likely"),
    ],
    privacy_score_impact: -2.0,
    confidence_level: 0.7,
};

const GITHUB: PlatformTraits = PlatformTraits {
    data_type: "professional_technical",
    indicators: &["technical_skills", "open_source_contribution", "coding_activity"],
    inferred: &[
        ("technical_expertise", "demonstrated"),
        ("programming_languages", "multiple_likely"),
        ("collaboration_style", "open_source"),
    ],
    privacy_score_impact: -1.0,
    confidence_level: 0.9,
};

const INSTAGRAM: PlatformTraits = PlatformTraits {
    data_type: "lifestyle_social",
    indicators: &["visual_content_sharing", "lifestyle_exposure", "social_connections"],
    inferred: &[("content_type", "visual_lifestyle")],
    privacy_score_impact: -1.8,
    confidence_level: 0.6,
};

const FACEBOOK: PlatformTraits = PlatformTraits {
    data_type: "personal_social",
    indicators: &["personal_network", "life_events_sharing", "family_connections"],
    inferred: &[
        ("social_network_type", "personal_family"),
        ("information_sharing", "potentially_detailed"),
    ],
    privacy_score_impact: -2.5,
    confidence_level: 0.5,
};

const GENERIC: PlatformTraits = PlatformTraits {
    data_type: "generic_web_presence",
    indicators: &["web_presence", "multi_platform_user"],
    inferred: &[
        ("digital_footprint", "expanded"),
        ("platform_diversity", "multi_platform"),
    ],
    privacy_score_impact: -0.8,
    confidence_level: 0.4,
};

fn traits_for(platform: &str) -> &'static PlatformTraits {
    match platform {
        "linkedin" => &LINKEDIN,
        "twitter" => &TWITTER,
        "github" => &GITHUB,
        "instagram" => &INSTAGRAM,
        "facebook" => &FACEBOOK,
        _ => &GENERIC,
    }
}

/// Profile skeleton with the platform's inferred traits
pub fn infer_profile(platform: &str, url: &str) -> Profile {
    let traits = traits_for(platform);

    let mut profile = Profile::new(platform, url).with_data_type(traits.data_type);
    for indicator in traits.indicators {
        profile = profile.with_indicator(indicator, true);
    }
    for (key, value) in traits.inferred {
        profile = profile.with_inferred(key, *value);
    }
    profile.privacy_score_impact = traits.privacy_score_impact;
    profile.confidence_level = traits.confidence_level;
    profile
}

/// Turn a discovered candidate into a correlator profile
pub fn profile_from_candidate(candidate: &SocialProfileCandidate) -> Profile {
    let mut profile =
        infer_profile(&candidate.platform, &candidate.url).with_username(&candidate.username);

    if let Some(created) = candidate.profile_data.get("created_at").and_then(Value::as_str) {
        profile = profile
            .with_created_at(created)
            .with_inferred("account_created", created);
    }
    profile
}

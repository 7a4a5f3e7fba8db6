use crate::domain::profile::{SleepQuality, UserProfile};
use crate::stack::goals::{is_canonical, lookup_key, normalize_goal};
use std::collections::BTreeSet;

// Health concern (lookup form) -> candidate tags.
const CONCERN_TAGS: &[(&str, &[&str])] = &[
    ("joint pain", &["joint-health"]),
    ("arthritis", &["joint-health"]),
    ("stiff joints", &["joint-health"]),
    ("insomnia", &["sleep"]),
    ("poor sleep", &["sleep"]),
    ("trouble sleeping", &["sleep"]),
    ("anxiety", &["stress-relief"]),
    ("stress", &["stress-relief"]),
    ("burnout", &["stress-relief", "energy"]),
    ("fatigue", &["energy"]),
    ("low energy", &["energy"]),
    ("tiredness", &["energy"]),
    ("brain fog", &["cognitive"]),
    ("poor focus", &["cognitive"]),
    ("memory", &["cognitive"]),
    ("frequent colds", &["immune-support"]),
    ("low immunity", &["immune-support"]),
    ("high cholesterol", &["heart-health"]),
    ("blood pressure", &["heart-health"]),
    ("inflammation", &["joint-health", "heart-health"]),
    ("bloating", &["gut-health"]),
    ("digestion", &["gut-health"]),
    ("digestive issues", &["gut-health"]),
    ("osteoporosis", &["bone-health"]),
    ("bone density", &["bone-health"]),
    ("vitamin d deficiency", &["bone-health", "immune-support"]),
    ("muscle soreness", &["recovery"]),
    ("slow recovery", &["recovery"]),
];

/// Candidate tags addressed by one health concern. Unknown concerns map to
/// nothing; a concern spelled as a canonical tag maps to itself.
pub fn concern_tags(raw: &str) -> BTreeSet<String> {
    let key = lookup_key(raw);
    if let Some((_, tags)) = CONCERN_TAGS.iter().find(|(concern, _)| *concern == key) {
        return tags.iter().map(|t| (*t).to_string()).collect();
    }

    let as_goal = normalize_goal(raw);
    if is_canonical(&as_goal) {
        return BTreeSet::from([as_goal]);
    }

    BTreeSet::new()
}

/// All concern tags for a profile, including implicit ones derived from
/// profile signals (poor sleep quality adds `sleep`).
pub fn profile_concern_tags(profile: &UserProfile) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = profile
        .health_concerns
        .iter()
        .flat_map(|c| concern_tags(c))
        .collect();

    if profile.sleep_quality == Some(SleepQuality::Poor) {
        out.insert("sleep".to_string());
    }

    out
}

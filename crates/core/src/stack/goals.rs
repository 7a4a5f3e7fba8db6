use std::collections::BTreeSet;

pub const CANONICAL_TAGS: &[&str] = &[
    "muscle-building",
    "weight-loss",
    "endurance",
    "energy",
    "recovery",
    "general-health",
    "sleep",
    "cognitive",
    "immune-support",
    "heart-health",
    "joint-health",
    "stress-relief",
    "gut-health",
    "bone-health",
];

// Keys are in lookup form (see `lookup_key`).
const GOAL_SYNONYMS: &[(&str, &str)] = &[
    ("muscle gain", "muscle-building"),
    ("gain muscle", "muscle-building"),
    ("build muscle", "muscle-building"),
    ("muscle growth", "muscle-building"),
    ("muscle", "muscle-building"),
    ("weight lifting", "muscle-building"),
    ("weightlifting", "muscle-building"),
    ("bodybuilding", "muscle-building"),
    ("bulking", "muscle-building"),
    ("hypertrophy", "muscle-building"),
    ("strength", "muscle-building"),
    ("lose weight", "weight-loss"),
    ("fat loss", "weight-loss"),
    ("burn fat", "weight-loss"),
    ("cutting", "weight-loss"),
    ("lean", "weight-loss"),
    ("cardio", "endurance"),
    ("running", "endurance"),
    ("stamina", "endurance"),
    ("more energy", "energy"),
    ("vitality", "energy"),
    ("muscle recovery", "recovery"),
    ("soreness", "recovery"),
    ("overall health", "general-health"),
    ("wellness", "general-health"),
    ("general wellness", "general-health"),
    ("longevity", "general-health"),
    ("better sleep", "sleep"),
    ("sleep quality", "sleep"),
    ("focus", "cognitive"),
    ("memory", "cognitive"),
    ("brain health", "cognitive"),
    ("immunity", "immune-support"),
    ("immune system", "immune-support"),
    ("heart", "heart-health"),
    ("cardiovascular health", "heart-health"),
    ("joints", "joint-health"),
    ("mobility", "joint-health"),
    ("stress", "stress-relief"),
    ("stress management", "stress-relief"),
    ("relaxation", "stress-relief"),
    ("digestion", "gut-health"),
    ("digestive health", "gut-health"),
    ("bones", "bone-health"),
];

/// Maps a free-text goal to its canonical tag. Unmapped goals come back
/// unchanged, so normalizing a canonical tag is a no-op.
pub fn normalize_goal(raw: &str) -> String {
    let key = lookup_key(raw);

    if let Some(tag) = CANONICAL_TAGS.iter().find(|t| lookup_key(t) == key) {
        return (*tag).to_string();
    }

    GOAL_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, tag)| (*tag).to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_goals<I, S>(goals: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    goals
        .into_iter()
        .filter(|g| !g.as_ref().trim().is_empty())
        .map(|g| normalize_goal(g.as_ref()))
        .collect()
}

pub fn is_canonical(tag: &str) -> bool {
    CANONICAL_TAGS.iter().any(|t| *t == tag)
}

/// Lowercase, `-`/`_` folded to spaces, whitespace collapsed.
pub(crate) fn lookup_key(s: &str) -> String {
    s.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

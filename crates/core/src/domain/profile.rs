use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

/// A validated user profile. Build it from a `ProfileRequest` at the edge;
/// the stack builder assumes every field here is well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub diet_type: Option<String>,
    pub sleep_quality: Option<SleepQuality>,
    pub fitness_goals: BTreeSet<String>,
    pub health_concerns: BTreeSet<String>,
    pub current_supplements: BTreeSet<String>,
    /// Monthly budget in USD.
    pub monthly_budget: f64,
    pub dietary_restrictions: BTreeSet<String>,
}

impl UserProfile {
    /// Diet type and dietary restrictions as one lowercase tag set.
    pub fn diet_tags(&self) -> BTreeSet<String> {
        self.diet_type
            .iter()
            .chain(self.dietary_restrictions.iter())
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn takes(&self, supplement_name: &str) -> bool {
        let name = supplement_name.trim();
        self.current_supplements
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diet_tags_merge_diet_type_and_restrictions() {
        let profile = UserProfile {
            diet_type: Some("Vegan".to_string()),
            dietary_restrictions: ["gluten-free".to_string(), " ".to_string()]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let tags = profile.diet_tags();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("vegan"));
        assert!(tags.contains("gluten-free"));
    }

    #[test]
    fn takes_matches_case_insensitively() {
        let profile = UserProfile {
            current_supplements: ["Creatine Monohydrate".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert!(profile.takes("creatine monohydrate"));
        assert!(!profile.takes("Whey Protein"));
    }
}

use crate::domain::money::{is_whole_cents, MAX_MONTHLY_AMOUNT};
use crate::domain::profile::{ActivityLevel, Gender, SleepQuality, UserProfile};
use crate::domain::supplement::SupplementCandidate;
use crate::stack::goals::{is_canonical, normalize_goal};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Wire form of a user profile, as posted by clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub diet_type: Option<String>,
    pub sleep_quality: Option<SleepQuality>,
    pub fitness_goals: Vec<String>,
    pub health_concerns: Vec<String>,
    pub current_supplements: Vec<String>,
    pub monthly_budget: Option<f64>,
    pub dietary_restrictions: Vec<String>,
}

impl ProfileRequest {
    pub fn validate_and_into_profile(self) -> anyhow::Result<UserProfile> {
        let monthly_budget = self.monthly_budget.unwrap_or(0.0);
        ensure!(
            monthly_budget.is_finite() && monthly_budget >= 0.0,
            "monthly_budget must be a non-negative amount (got {monthly_budget})"
        );
        ensure!(
            monthly_budget <= MAX_MONTHLY_AMOUNT,
            "monthly_budget must be at most {MAX_MONTHLY_AMOUNT} (got {monthly_budget})"
        );

        if let Some(age) = self.age {
            ensure!((1..=120).contains(&age), "age out of range: {age}");
        }

        if let Some(weight) = self.weight_kg {
            ensure!(
                weight.is_finite() && weight > 0.0,
                "weight_kg must be positive (got {weight})"
            );
        }

        let diet_type = self
            .diet_type
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(UserProfile {
            age: self.age,
            gender: self.gender,
            weight_kg: self.weight_kg,
            activity_level: self.activity_level,
            diet_type,
            sleep_quality: self.sleep_quality,
            fitness_goals: clean_set(self.fitness_goals),
            health_concerns: clean_set(self.health_concerns),
            current_supplements: clean_set(self.current_supplements),
            monthly_budget,
            dietary_restrictions: clean_set(self.dietary_restrictions),
        })
    }
}

/// Checks a catalog record coming from an external source.
pub fn validate_candidate(candidate: &SupplementCandidate) -> anyhow::Result<()> {
    ensure!(
        !candidate.name.trim().is_empty(),
        "supplement name must be non-empty"
    );
    ensure!(
        candidate.monthly_price.is_finite() && candidate.monthly_price >= 0.0,
        "monthly_price must be a non-negative amount for {} (got {})",
        candidate.name,
        candidate.monthly_price
    );
    ensure!(
        candidate.monthly_price <= MAX_MONTHLY_AMOUNT,
        "monthly_price must be at most {MAX_MONTHLY_AMOUNT} for {} (got {})",
        candidate.name,
        candidate.monthly_price
    );
    ensure!(
        is_whole_cents(candidate.monthly_price),
        "monthly_price must be whole cents for {} (got {})",
        candidate.name,
        candidate.monthly_price
    );
    ensure!(
        candidate.target_tags.iter().any(|t| !t.trim().is_empty()),
        "target_tags must be non-empty for {}",
        candidate.name
    );
    Ok(())
}

/// Validates a catalog record and brings its tags into the form the ranker
/// matches on: target tags through the goal normalizer, diets lowercased.
pub fn validate_and_normalize_candidate(
    candidate: SupplementCandidate,
) -> anyhow::Result<SupplementCandidate> {
    validate_candidate(&candidate)?;

    let target_tags: BTreeSet<String> = candidate
        .target_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(normalize_goal)
        .collect();
    for tag in target_tags.iter().filter(|t| !is_canonical(t)) {
        tracing::debug!(name = %candidate.name, %tag, "catalog tag is not a canonical goal tag");
    }

    let incompatible_diets = candidate
        .incompatible_diets
        .iter()
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect();

    Ok(SupplementCandidate {
        name: candidate.name.trim().to_string(),
        target_tags,
        incompatible_diets,
        ..candidate
    })
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::supplement::EvidenceLevel;
    use serde_json::json;

    #[test]
    fn missing_budget_defaults_to_zero() {
        let req: ProfileRequest = serde_json::from_value(json!({
            "fitness_goals": ["muscle gain"],
        }))
        .unwrap();
        let profile = req.validate_and_into_profile().unwrap();
        assert_eq!(profile.monthly_budget, 0.0);
        assert!(profile.fitness_goals.contains("muscle gain"));
    }

    #[test]
    fn accepts_full_profile() {
        let req: ProfileRequest = serde_json::from_value(json!({
            "age": 34,
            "gender": "female",
            "weight_kg": 62.5,
            "activity_level": "very_active",
            "diet_type": " vegan ",
            "sleep_quality": "poor",
            "fitness_goals": ["bulking", "  "],
            "health_concerns": ["joint pain"],
            "current_supplements": ["Vitamin D3"],
            "monthly_budget": 80.0,
            "dietary_restrictions": ["gluten-free"],
        }))
        .unwrap();
        let profile = req.validate_and_into_profile().unwrap();
        assert_eq!(profile.diet_type.as_deref(), Some("vegan"));
        assert_eq!(profile.fitness_goals.len(), 1);
        assert_eq!(profile.activity_level, Some(ActivityLevel::VeryActive));
        assert_eq!(profile.sleep_quality, Some(SleepQuality::Poor));
    }

    #[test]
    fn rejects_negative_budget() {
        let req = ProfileRequest {
            monthly_budget: Some(-5.0),
            ..Default::default()
        };
        assert!(req.validate_and_into_profile().is_err());
    }

    #[test]
    fn rejects_non_finite_budget() {
        let req = ProfileRequest {
            monthly_budget: Some(f64::NAN),
            ..Default::default()
        };
        assert!(req.validate_and_into_profile().is_err());
    }

    #[test]
    fn rejects_out_of_range_age_and_weight() {
        let req = ProfileRequest {
            age: Some(0),
            ..Default::default()
        };
        assert!(req.validate_and_into_profile().is_err());

        let req = ProfileRequest {
            weight_kg: Some(0.0),
            ..Default::default()
        };
        assert!(req.validate_and_into_profile().is_err());
    }

    #[test]
    fn rejects_unknown_enum_values_via_deserialize() {
        let res = serde_json::from_value::<ProfileRequest>(json!({
            "activity_level": "couch",
        }));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_oversized_budget() {
        let req = ProfileRequest {
            monthly_budget: Some(1e20),
            ..Default::default()
        };
        assert!(req.validate_and_into_profile().is_err());
    }

    fn creatine() -> SupplementCandidate {
        SupplementCandidate {
            name: " Creatine ".to_string(),
            category: "performance".to_string(),
            monthly_price: 28.0,
            evidence_level: EvidenceLevel::VeryHigh,
            study_count: 700,
            target_tags: ["Muscle_Building".to_string(), "Focus".to_string()]
                .into_iter()
                .collect(),
            reasoning_template: String::new(),
            dosage: "5 g".to_string(),
            timing: "daily".to_string(),
            incompatible_diets: [" Vegan ".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn rejects_sub_cent_and_oversized_prices() {
        let mut c = creatine();
        c.monthly_price = 10.004;
        assert!(validate_candidate(&c).is_err());

        c.monthly_price = 1e19;
        assert!(validate_candidate(&c).is_err());

        c.monthly_price = 14.99;
        assert!(validate_candidate(&c).is_ok());
    }

    #[test]
    fn normalizes_catalog_tags_and_diets() {
        let c = validate_and_normalize_candidate(creatine()).unwrap();
        assert_eq!(c.name, "Creatine");
        assert_eq!(
            c.target_tags,
            BTreeSet::from(["cognitive".to_string(), "muscle-building".to_string()])
        );
        assert_eq!(c.incompatible_diets, BTreeSet::from(["vegan".to_string()]));
    }

    #[test]
    fn candidate_validation() {
        let mut c = SupplementCandidate {
            name: "Magnesium Glycinate".to_string(),
            category: "mineral".to_string(),
            monthly_price: 15.0,
            evidence_level: EvidenceLevel::High,
            study_count: 120,
            target_tags: ["sleep".to_string()].into_iter().collect(),
            reasoning_template: String::new(),
            dosage: "300 mg".to_string(),
            timing: "evening".to_string(),
            incompatible_diets: BTreeSet::new(),
        };
        assert!(validate_candidate(&c).is_ok());

        c.monthly_price = -1.0;
        assert!(validate_candidate(&c).is_err());

        c.monthly_price = 15.0;
        c.target_tags.clear();
        assert!(validate_candidate(&c).is_err());

        c.target_tags.insert("sleep".to_string());
        c.name = "  ".to_string();
        assert!(validate_candidate(&c).is_err());
    }
}

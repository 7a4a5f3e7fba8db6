use crate::catalog::CatalogStore;
use crate::domain::supplement::{EvidenceLevel, SupplementCandidate};
use crate::domain::supplement::EvidenceLevel::{High, Low, Moderate, VeryHigh};

/// Built-in reference catalog. Used to seed the database and as the catalog
/// of last resort when no database is configured.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    candidates: Vec<SupplementCandidate>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self {
            candidates: reference_candidates(),
        }
    }
}

impl StaticCatalog {
    pub fn new(candidates: Vec<SupplementCandidate>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[SupplementCandidate] {
        &self.candidates
    }
}

#[async_trait::async_trait]
impl CatalogStore for StaticCatalog {
    fn store_name(&self) -> &'static str {
        "static"
    }

    async fn list_candidates(&self) -> anyhow::Result<Vec<SupplementCandidate>> {
        Ok(self.candidates.clone())
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    name: &str,
    category: &str,
    monthly_price: f64,
    evidence_level: EvidenceLevel,
    study_count: u32,
    target_tags: &[&str],
    dosage: &str,
    timing: &str,
    reasoning_template: &str,
    incompatible_diets: &[&str],
) -> SupplementCandidate {
    SupplementCandidate {
        name: name.to_string(),
        category: category.to_string(),
        monthly_price,
        evidence_level,
        study_count,
        target_tags: target_tags.iter().map(|t| t.to_string()).collect(),
        reasoning_template: reasoning_template.to_string(),
        dosage: dosage.to_string(),
        timing: timing.to_string(),
        incompatible_diets: incompatible_diets.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn reference_candidates() -> Vec<SupplementCandidate> {
    vec![
        entry(
            "Whey Protein Isolate",
            "protein",
            55.0,
            VeryHigh,
            320,
            &["muscle-building", "recovery", "weight-loss"],
            "25-30 g",
            "within 30 minutes after training",
            "{name} is a fast-digesting complete protein that supports {goals}.",
            &["vegan", "dairy-free"],
        ),
        entry(
            "Creatine Monohydrate",
            "performance",
            28.0,
            VeryHigh,
            700,
            &["muscle-building", "cognitive"],
            "5 g",
            "daily, any time",
            "{name} is the most studied performance supplement; it supports {goals}.",
            &[],
        ),
        entry(
            "Vitamin D3",
            "vitamin",
            9.0,
            VeryHigh,
            380,
            &["bone-health", "immune-support", "general-health"],
            "2000 IU",
            "morning, with a meal containing fat",
            "{name} corrects a common deficiency and supports {goals}.",
            &[],
        ),
        entry(
            "Omega-3 Fish Oil",
            "essential fatty acid",
            25.0,
            VeryHigh,
            450,
            &["heart-health", "joint-health", "cognitive", "general-health"],
            "2 g EPA+DHA",
            "with meals",
            "{name} provides EPA and DHA for {goals}.",
            &["vegan", "vegetarian"],
        ),
        entry(
            "Plant Protein Blend",
            "protein",
            45.0,
            High,
            60,
            &["muscle-building", "recovery"],
            "30 g",
            "after training",
            "{name} is a dairy-free complete protein for {goals}.",
            &[],
        ),
        entry(
            "Magnesium Glycinate",
            "mineral",
            15.0,
            High,
            150,
            &["sleep", "stress-relief", "recovery"],
            "300-400 mg",
            "evening",
            "{name} is well absorbed and supports {goals}.",
            &[],
        ),
        entry(
            "Zinc Picolinate",
            "mineral",
            7.0,
            High,
            130,
            &["immune-support"],
            "15-30 mg",
            "with dinner",
            "{name} supports {goals}.",
            &[],
        ),
        entry(
            "Caffeine + L-Theanine",
            "stimulant",
            18.0,
            High,
            85,
            &["energy", "cognitive", "endurance"],
            "100 mg + 200 mg",
            "morning or 45 minutes before training",
            "{name} gives smooth alertness for {goals}.",
            &[],
        ),
        entry(
            "Ashwagandha (KSM-66)",
            "adaptogen",
            22.0,
            High,
            70,
            &["stress-relief", "sleep"],
            "600 mg",
            "evening",
            "{name} lowers cortisol and supports {goals}.",
            &[],
        ),
        entry(
            "Beta-Alanine",
            "performance",
            20.0,
            High,
            90,
            &["endurance"],
            "3.2-6.4 g",
            "split doses with meals",
            "{name} buffers muscle acidity during efforts lasting 1-4 minutes ({goals}).",
            &[],
        ),
        entry(
            "Algae Omega-3",
            "essential fatty acid",
            32.0,
            High,
            40,
            &["heart-health", "cognitive"],
            "500 mg DHA",
            "with meals",
            "{name} is a plant-based EPA/DHA source for {goals}.",
            &[],
        ),
        entry(
            "Multivitamin",
            "vitamin",
            20.0,
            Moderate,
            90,
            &["general-health", "energy"],
            "1 tablet",
            "with breakfast",
            "{name} covers common micronutrient gaps ({goals}).",
            &[],
        ),
        entry(
            "Probiotic Complex",
            "gut",
            30.0,
            Moderate,
            200,
            &["gut-health", "immune-support"],
            "10-20 billion CFU",
            "morning, before breakfast",
            "{name} supports {goals}.",
            &[],
        ),
        entry(
            "Green Tea Extract",
            "metabolic",
            16.0,
            Moderate,
            100,
            &["weight-loss", "energy"],
            "400-500 mg EGCG",
            "with meals",
            "{name} modestly raises energy expenditure ({goals}).",
            &[],
        ),
        entry(
            "Glucosamine & Chondroitin",
            "joint",
            24.0,
            Moderate,
            110,
            &["joint-health"],
            "1500 mg + 1200 mg",
            "with meals",
            "{name} supports cartilage for {goals}.",
            &["vegan", "vegetarian", "shellfish-allergy"],
        ),
        entry(
            "Melatonin",
            "sleep aid",
            8.0,
            Moderate,
            120,
            &["sleep"],
            "0.5-3 mg",
            "30-60 minutes before bed",
            "{name} helps regulate sleep onset ({goals}).",
            &[],
        ),
        entry(
            "Electrolyte Mix",
            "hydration",
            19.0,
            Moderate,
            30,
            &["endurance", "recovery"],
            "1 serving per hour of training",
            "during long sessions",
            "{name} replaces sodium and potassium lost in sweat ({goals}).",
            &[],
        ),
        entry(
            "Collagen Peptides",
            "protein",
            35.0,
            Low,
            25,
            &["joint-health", "recovery"],
            "10-15 g",
            "before training",
            "{name} may support connective tissue for {goals}.",
            &["vegan", "vegetarian"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::validate_candidate;
    use crate::stack::goals::is_canonical;
    use std::collections::BTreeSet;

    #[test]
    fn reference_catalog_is_valid() {
        let catalog = reference_candidates();
        for c in &catalog {
            validate_candidate(c).unwrap();
            for tag in &c.target_tags {
                assert!(is_canonical(tag), "{} has non-canonical tag {tag}", c.name);
            }
        }

        let names: BTreeSet<_> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), catalog.len(), "duplicate names in reference catalog");
    }

    #[test]
    fn reference_catalog_has_general_health_fallback() {
        assert!(reference_candidates()
            .iter()
            .any(|c| c.target_tags.contains("general-health")));
    }
}

use crate::domain::profile::UserProfile;
use crate::domain::supplement::SupplementCandidate;
use std::collections::BTreeSet;

pub const FALLBACK_TAG: &str = "general-health";

#[derive(Debug, Clone)]
pub struct RankedCandidate<'a> {
    pub candidate: &'a SupplementCandidate,
    pub matched_tags: Vec<String>,
}

/// Keeps candidates whose tags intersect the wanted tags and that the user
/// can and does not already take. Ordered by evidence level, then study
/// count, then number of matched tags, all descending; remaining ties keep
/// catalog order.
pub fn rank_candidates<'a>(
    profile: &UserProfile,
    wanted_tags: &BTreeSet<String>,
    candidates: &'a [SupplementCandidate],
) -> Vec<RankedCandidate<'a>> {
    let diet_tags = profile.diet_tags();

    let mut ranked: Vec<RankedCandidate<'a>> = candidates
        .iter()
        .filter(|c| !profile.takes(&c.name))
        .filter(|c| c.is_compatible_with(&diet_tags))
        .filter_map(|c| {
            let matched_tags: Vec<String> =
                c.target_tags.intersection(wanted_tags).cloned().collect();
            if matched_tags.is_empty() {
                return None;
            }
            Some(RankedCandidate {
                candidate: c,
                matched_tags,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.candidate
            .evidence_level
            .cmp(&a.candidate.evidence_level)
            .then_with(|| b.candidate.study_count.cmp(&a.candidate.study_count))
            .then_with(|| b.matched_tags.len().cmp(&a.matched_tags.len()))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::supplement::EvidenceLevel;

    fn candidate(name: &str, level: EvidenceLevel, studies: u32, tags: &[&str]) -> SupplementCandidate {
        SupplementCandidate {
            name: name.to_string(),
            category: "test".to_string(),
            monthly_price: 10.0,
            evidence_level: level,
            study_count: studies,
            target_tags: tags.iter().map(|t| t.to_string()).collect(),
            reasoning_template: String::new(),
            dosage: String::new(),
            timing: String::new(),
            incompatible_diets: BTreeSet::new(),
        }
    }

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    fn names<'a>(ranked: &'a [RankedCandidate<'_>]) -> Vec<&'a str> {
        ranked.iter().map(|r| r.candidate.name.as_str()).collect()
    }

    #[test]
    fn filters_to_matching_tags() {
        let catalog = vec![
            candidate("A", EvidenceLevel::High, 10, &["sleep"]),
            candidate("B", EvidenceLevel::High, 10, &["muscle-building"]),
        ];
        let ranked = rank_candidates(&UserProfile::default(), &tags(&["sleep"]), &catalog);
        assert_eq!(names(&ranked), vec!["A"]);
        assert_eq!(ranked[0].matched_tags, vec!["sleep".to_string()]);
    }

    #[test]
    fn orders_by_evidence_then_study_count() {
        let catalog = vec![
            candidate("low", EvidenceLevel::Low, 900, &["energy"]),
            candidate("high-few", EvidenceLevel::High, 10, &["energy"]),
            candidate("very-high", EvidenceLevel::VeryHigh, 5, &["energy"]),
            candidate("high-many", EvidenceLevel::High, 200, &["energy"]),
            candidate("moderate", EvidenceLevel::Moderate, 50, &["energy"]),
        ];
        let ranked = rank_candidates(&UserProfile::default(), &tags(&["energy"]), &catalog);
        assert_eq!(
            names(&ranked),
            vec!["very-high", "high-many", "high-few", "moderate", "low"]
        );
    }

    #[test]
    fn more_matched_tags_win_remaining_ties_and_catalog_order_is_stable() {
        let catalog = vec![
            candidate("first", EvidenceLevel::High, 10, &["energy"]),
            candidate("second", EvidenceLevel::High, 10, &["energy"]),
            candidate("both", EvidenceLevel::High, 10, &["energy", "sleep"]),
        ];
        let ranked = rank_candidates(&UserProfile::default(), &tags(&["energy", "sleep"]), &catalog);
        assert_eq!(names(&ranked), vec!["both", "first", "second"]);
    }

    #[test]
    fn excludes_current_supplements_and_incompatible_diets() {
        let mut whey = candidate("Whey Protein", EvidenceLevel::VeryHigh, 300, &["muscle-building"]);
        whey.incompatible_diets = tags(&["vegan"]);
        let catalog = vec![
            whey,
            candidate("Creatine", EvidenceLevel::VeryHigh, 500, &["muscle-building"]),
            candidate("Pea Protein", EvidenceLevel::High, 40, &["muscle-building"]),
        ];
        let profile = UserProfile {
            diet_type: Some("vegan".to_string()),
            current_supplements: tags(&["creatine"]),
            ..Default::default()
        };
        let ranked = rank_candidates(&profile, &tags(&["muscle-building"]), &catalog);
        assert_eq!(names(&ranked), vec!["Pea Protein"]);
    }
}

use crate::domain::money::{budget_cents, from_cents, price_cents};
use crate::stack::rank::RankedCandidate;

/// Greedy single pass over the ranked list: take each candidate whose price
/// still fits under the budget, skip the rest. The chosen total never
/// exceeds `budget`.
pub fn allocate<'a>(
    ranked: Vec<RankedCandidate<'a>>,
    budget: f64,
    max_items: Option<usize>,
) -> Vec<RankedCandidate<'a>> {
    let limit = budget_cents(budget);
    if limit <= 0 {
        return Vec::new();
    }

    let mut spent: i64 = 0;
    let mut chosen = Vec::new();
    for entry in ranked {
        if max_items.is_some_and(|max| chosen.len() >= max) {
            break;
        }
        let price = price_cents(entry.candidate.monthly_price);
        match spent.checked_add(price) {
            Some(next) if next <= limit => {
                spent = next;
                chosen.push(entry);
                continue;
            }
            _ => {}
        }
        tracing::trace!(
            name = %entry.candidate.name,
            price = entry.candidate.monthly_price,
            remaining = from_cents(limit - spent),
            "candidate over remaining budget; skipped"
        );
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::supplement::{EvidenceLevel, SupplementCandidate};
    use std::collections::BTreeSet;

    fn candidate(name: &str, price: f64) -> SupplementCandidate {
        SupplementCandidate {
            name: name.to_string(),
            category: "test".to_string(),
            monthly_price: price,
            evidence_level: EvidenceLevel::High,
            study_count: 1,
            target_tags: BTreeSet::from(["energy".to_string()]),
            reasoning_template: String::new(),
            dosage: String::new(),
            timing: String::new(),
            incompatible_diets: BTreeSet::new(),
        }
    }

    fn ranked(catalog: &[SupplementCandidate]) -> Vec<RankedCandidate<'_>> {
        catalog
            .iter()
            .map(|c| RankedCandidate {
                candidate: c,
                matched_tags: vec!["energy".to_string()],
            })
            .collect()
    }

    fn chosen_names(chosen: &[RankedCandidate<'_>]) -> Vec<String> {
        chosen.iter().map(|r| r.candidate.name.clone()).collect()
    }

    #[test]
    fn skips_unaffordable_and_keeps_scanning() {
        let catalog = vec![candidate("a", 30.0), candidate("b", 25.0), candidate("c", 20.0)];
        let chosen = allocate(ranked(&catalog), 50.0, None);
        assert_eq!(chosen_names(&chosen), vec!["a", "c"]);
    }

    #[test]
    fn zero_or_negative_budget_takes_nothing() {
        let catalog = vec![candidate("a", 0.5)];
        assert!(allocate(ranked(&catalog), 0.0, None).is_empty());
        assert!(allocate(ranked(&catalog), -10.0, None).is_empty());
    }

    #[test]
    fn budget_below_cheapest_takes_nothing() {
        let catalog = vec![candidate("a", 12.0), candidate("b", 9.99)];
        assert!(allocate(ranked(&catalog), 9.98, None).is_empty());
    }

    #[test]
    fn exact_fit_is_allowed_despite_float_noise() {
        let catalog = vec![candidate("a", 0.1), candidate("b", 0.2)];
        let chosen = allocate(ranked(&catalog), 0.3, None);
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn sub_cent_budget_rounds_down() {
        let catalog = vec![candidate("a", 10.0)];
        assert!(allocate(ranked(&catalog), 9.999, None).is_empty());
    }

    #[test]
    fn sub_cent_price_rounds_up() {
        let catalog = vec![candidate("a", 10.004)];
        assert!(allocate(ranked(&catalog), 10.0, None).is_empty());
        assert_eq!(allocate(ranked(&catalog), 10.01, None).len(), 1);
    }

    #[test]
    fn huge_price_and_budget_do_not_overflow() {
        let catalog = vec![candidate("a", 1.0), candidate("b", 1e19), candidate("c", 2.0)];
        let chosen = allocate(ranked(&catalog), 1e20, None);
        assert_eq!(chosen_names(&chosen), vec!["a", "c"]);
    }

    #[test]
    fn max_items_caps_the_stack() {
        let catalog = vec![candidate("a", 1.0), candidate("b", 1.0), candidate("c", 1.0)];
        let chosen = allocate(ranked(&catalog), 100.0, Some(2));
        assert_eq!(chosen_names(&chosen), vec!["a", "b"]);
    }

    #[test]
    fn total_never_exceeds_budget() {
        let prices = [55.0, 28.0, 12.5, 9.99, 40.0, 3.25, 19.0, 0.0, 75.0];
        let catalog: Vec<_> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| candidate(&format!("c{i}"), *p))
            .collect();

        for budget_cents in (0..=25_000).step_by(37) {
            let budget = budget_cents as f64 / 100.0;
            let chosen = allocate(ranked(&catalog), budget, None);
            let total: i64 = chosen
                .iter()
                .map(|r| price_cents(r.candidate.monthly_price))
                .sum();
            assert!(total <= budget_cents, "budget {budget} exceeded: {total}");
        }
    }
}

//! Budget-constrained supplement stack construction.
//!
//! Pipeline: normalize goals and map health concerns to tags, rank the
//! matching candidates, then greedily fill the monthly budget.

pub mod allocate;
pub mod concerns;
pub mod goals;
pub mod rank;

use crate::domain::money;
use crate::domain::profile::UserProfile;
use crate::domain::stack::{Stack, StackItem};
use crate::domain::supplement::SupplementCandidate;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct StackOptions {
    /// When nothing matches the profile, recommend `general-health` candidates instead.
    pub general_health_fallback: bool,

    pub max_items: Option<usize>,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            general_health_fallback: true,
            max_items: None,
        }
    }
}

impl StackOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("STACK_GENERAL_HEALTH_FALLBACK") {
            if let Ok(b) = s.trim().parse::<bool>() {
                out.general_health_fallback = b;
            }
        }

        if let Ok(s) = std::env::var("STACK_MAX_ITEMS") {
            if let Ok(n) = s.trim().parse::<usize>() {
                out.max_items = Some(n);
            }
        }

        out
    }
}

/// Builds a stack for `profile` out of `candidates`. Pure and infallible:
/// unmapped goals, a zero budget or an empty catalog all yield a smaller
/// (possibly empty) stack.
pub fn build_stack(
    profile: &UserProfile,
    candidates: &[SupplementCandidate],
    opts: &StackOptions,
) -> Stack {
    let budget = profile.monthly_budget;

    let mut wanted = goals::normalize_goals(&profile.fitness_goals);
    wanted.extend(concerns::profile_concern_tags(profile));

    let mut ranked = rank::rank_candidates(profile, &wanted, candidates);
    let mut used_fallback = false;
    if ranked.is_empty() && opts.general_health_fallback && !candidates.is_empty() {
        let fallback = BTreeSet::from([rank::FALLBACK_TAG.to_string()]);
        ranked = rank::rank_candidates(profile, &fallback, candidates);
        used_fallback = true;
    }
    let ranked_len = ranked.len();

    let chosen = allocate::allocate(ranked, budget, opts.max_items);

    let mut total_cents: i64 = 0;
    let mut evidence_total: u32 = 0;
    let mut supplements = Vec::with_capacity(chosen.len());
    for (idx, entry) in chosen.into_iter().enumerate() {
        let c = entry.candidate;
        total_cents = total_cents.saturating_add(money::price_cents(c.monthly_price));
        evidence_total += u32::from(c.evidence_level.weight());

        supplements.push(StackItem {
            rank: (idx + 1) as i32,
            name: c.name.clone(),
            category: c.category.clone(),
            dosage: c.dosage.clone(),
            timing: c.timing.clone(),
            monthly_price: c.monthly_price,
            evidence_level: c.evidence_level,
            study_count: c.study_count,
            reasoning: render_reasoning(&c.reasoning_template, &c.name, &entry.matched_tags),
            matched_tags: entry.matched_tags,
        });
    }

    let evidence_score = if supplements.is_empty() {
        0.0
    } else {
        f64::from(evidence_total) / supplements.len() as f64
    };

    tracing::debug!(
        budget,
        wanted_tags = ?wanted,
        catalog_len = candidates.len(),
        ranked_len,
        used_fallback,
        chosen_len = supplements.len(),
        total_cents,
        "built supplement stack"
    );

    Stack {
        supplements,
        total_monthly_cost: money::from_cents(total_cents),
        evidence_score,
        budget,
    }
}

fn render_reasoning(template: &str, name: &str, matched_tags: &[String]) -> String {
    let goals = matched_tags.join(", ");
    let rendered = template.replace("{name}", name).replace("{goals}", &goals);
    if rendered.trim().is_empty() {
        return format!("{name} supports {goals}.");
    }
    rendered
}

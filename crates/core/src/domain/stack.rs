use crate::domain::supplement::EvidenceLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub supplements: Vec<StackItem>,
    pub total_monthly_cost: f64,
    pub evidence_score: f64,
    pub budget: f64,
}

impl Stack {
    pub fn empty(budget: f64) -> Self {
        Self {
            supplements: Vec::new(),
            total_monthly_cost: 0.0,
            evidence_score: 0.0,
            budget,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.supplements.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.supplements.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackItem {
    pub rank: i32,
    pub name: String,
    pub category: String,
    pub dosage: String,
    pub timing: String,
    pub monthly_price: f64,
    pub evidence_level: EvidenceLevel,
    pub study_count: u32,
    pub matched_tags: Vec<String>,
    pub reasoning: String,
}

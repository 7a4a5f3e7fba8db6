use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Strength of scientific support for a supplement's efficacy claim.
/// Variant order is the ranking order: `Low < Moderate < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl EvidenceLevel {
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Moderate => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            "very_high" => Ok(Self::VeryHigh),
            other => anyhow::bail!("unknown evidence level: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementCandidate {
    pub name: String,
    pub category: String,
    /// Monthly price in USD.
    pub monthly_price: f64,
    pub evidence_level: EvidenceLevel,
    pub study_count: u32,
    /// Canonical goal / concern tags this supplement addresses.
    pub target_tags: BTreeSet<String>,
    /// May contain `{name}` and `{goals}` placeholders.
    pub reasoning_template: String,
    pub dosage: String,
    pub timing: String,
    #[serde(default)]
    pub incompatible_diets: BTreeSet<String>,
}

impl SupplementCandidate {
    pub fn is_compatible_with(&self, diet_tags: &BTreeSet<String>) -> bool {
        !self
            .incompatible_diets
            .iter()
            .any(|d| diet_tags.contains(&d.trim().to_ascii_lowercase()))
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::verify::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContradictionConfidence {
    Low,
    Med,
    High,
}

impl fmt::Display for ContradictionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContradictionConfidence::Low => "low",
            ContradictionConfidence::Med => "med",
            ContradictionConfidence::High => "high",
        })
    }
}

/// A suspected conflict between two evidence paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionRecord {
    /// The two paragraphs, in evidence order. The relation itself is symmetric.
    pub paragraph_ids: [String; 2],
    pub rationale: String,
    pub confidence: ContradictionConfidence,
    pub tier: Tier,
}

impl ContradictionRecord {
    pub fn involves(&self, paragraph_id: &str) -> bool {
        self.paragraph_ids.iter().any(|id| id == paragraph_id)
    }
}

/// Verdict of a tier-2 contradiction judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionVerdict {
    pub contradiction: bool,
    #[serde(default)]
    pub rationale: String,
}

/// What to do with an answer whose evidence conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionPolicy {
    /// Cite both sides and append a caveat.
    #[default]
    Surface,
    /// Refuse when any conflict is high confidence, otherwise surface.
    AbstainOnHigh,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown contradiction policy `{0}`, expected `surface` or `abstain_on_high`")]
pub struct UnknownPolicy(pub String);

impl FromStr for ContradictionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(ContradictionPolicy::Surface),
            "abstain_on_high" => Ok(ContradictionPolicy::AbstainOnHigh),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ContradictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContradictionPolicy::Surface => "surface",
            ContradictionPolicy::AbstainOnHigh => "abstain_on_high",
        })
    }
}

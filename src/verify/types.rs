use serde::{Deserialize, Serialize};

/// Which strategy produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    /// Deterministic heuristic, always available.
    Heuristic = 1,
    /// Model judge.
    Judge = 2,
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier as u8
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Heuristic),
            2 => Ok(Tier::Judge),
            other => Err(format!("unknown verification tier {other}")),
        }
    }
}

/// Verdict of a tier-2 support judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportVerdict {
    pub supported: bool,
    #[serde(default)]
    pub rationale: String,
    /// Verbatim span of the cited evidence backing the claim.
    #[serde(default)]
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim_id: String,
    pub text: String,
    /// Citations restricted to paragraph ids present in the evidence.
    pub citations: Vec<String>,
    pub supported: bool,
    pub support_rationale: String,
    pub verification_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub claims: Vec<ClaimVerdict>,
    pub supported_claims: usize,
    pub unsupported_claims: usize,
    /// `supported / total`, or `1.0` when there are no claims.
    pub support_rate: f32,
}

impl VerificationSummary {
    pub fn from_verdicts(claims: Vec<ClaimVerdict>) -> Self {
        let supported_claims = claims.iter().filter(|c| c.supported).count();
        let unsupported_claims = claims.len() - supported_claims;
        let support_rate = if claims.is_empty() {
            1.0
        } else {
            supported_claims as f32 / claims.len() as f32
        };

        Self {
            claims,
            supported_claims,
            unsupported_claims,
            support_rate,
        }
    }
}

/// Answer state after a policy stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyOutcome {
    pub answer: String,
    pub citations: Vec<String>,
    /// Note codes added by this stage only.
    pub notes: Vec<String>,
}

impl PolicyOutcome {
    pub fn unchanged(answer: &str, citations: &[String]) -> Self {
        Self {
            answer: answer.to_string(),
            citations: citations.to_vec(),
            notes: Vec::new(),
        }
    }

    /// The refusal sentinel with empty citations and one explanatory note.
    pub fn refusal(note: &str) -> Self {
        Self {
            answer: crate::constants::INSUFFICIENT_EVIDENCE.to_string(),
            citations: Vec::new(),
            notes: vec![note.to_string()],
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::heuristic::verify_heuristic;
use super::types::{ClaimVerdict, SupportVerdict, Tier, VerificationSummary};
use crate::claims::Claim;
use crate::constants::DEFAULT_OVERLAP_THRESHOLD;
use crate::evidence::EvidenceItem;
use crate::judge::JudgeError;

/// Tier-2 claim-support judge.
#[async_trait]
pub trait SupportJudge: Send + Sync {
    async fn judge_claim(&self, claim: &str, cited_texts: &[&str]) -> Result<SupportVerdict, JudgeError>;
}

/// `paragraph_id -> text` view over an evidence list.
pub fn evidence_lookup(evidence: &[EvidenceItem]) -> HashMap<&str, &str> {
    evidence
        .iter()
        .map(|e| (e.paragraph_id.as_str(), e.text.as_str()))
        .collect()
}

/// Per-claim verifier: the tier-2 judge when configured, the keyword
/// heuristic otherwise and whenever the judge fails.
#[derive(Clone)]
pub struct ClaimVerifier {
    overlap_threshold: f32,
    judge: Option<Arc<dyn SupportJudge>>,
}

impl std::fmt::Debug for ClaimVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimVerifier")
            .field("overlap_threshold", &self.overlap_threshold)
            .field("has_judge", &self.judge.is_some())
            .finish()
    }
}

impl Default for ClaimVerifier {
    fn default() -> Self {
        Self::heuristic(DEFAULT_OVERLAP_THRESHOLD)
    }
}

impl ClaimVerifier {
    pub fn heuristic(overlap_threshold: f32) -> Self {
        Self {
            overlap_threshold,
            judge: None,
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn SupportJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn overlap_threshold(&self) -> f32 {
        self.overlap_threshold
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub async fn verify_claims(&self, claims: &[Claim], lookup: &HashMap<&str, &str>) -> VerificationSummary {
        let mut verdicts = Vec::with_capacity(claims.len());
        for claim in claims {
            verdicts.push(self.verify_claim(claim, lookup).await);
        }

        let summary = VerificationSummary::from_verdicts(verdicts);
        debug!(
            claims = claims.len(),
            supported = summary.supported_claims,
            support_rate = summary.support_rate,
            "Verified claims"
        );
        summary
    }

    pub async fn verify_claim(&self, claim: &Claim, lookup: &HashMap<&str, &str>) -> ClaimVerdict {
        let citations: Vec<String> = claim
            .citations
            .iter()
            .filter(|id| lookup.contains_key(id.as_str()))
            .cloned()
            .collect();
        let cited: Vec<&str> = citations
            .iter()
            .filter_map(|id| lookup.get(id.as_str()).copied())
            .collect();

        if let Some(judge) = &self.judge
            && !cited.is_empty()
        {
            match judge.judge_claim(&claim.text, &cited).await {
                Ok(verdict) if is_well_formed(&verdict, &cited) => {
                    return ClaimVerdict {
                        claim_id: claim.claim_id.clone(),
                        text: claim.text.clone(),
                        citations,
                        supported: verdict.supported,
                        support_rationale: format!("LLM: {}", verdict.rationale),
                        verification_tier: Tier::Judge,
                    };
                }
                Ok(_) => {
                    warn!(
                        claim_id = %claim.claim_id,
                        "Claim judge quote not found in cited evidence, falling back to heuristic"
                    );
                }
                Err(e) => {
                    warn!(
                        claim_id = %claim.claim_id,
                        error = %e,
                        "Claim judge failed, falling back to heuristic"
                    );
                }
            }
        }

        let heuristic = verify_heuristic(&claim.text, &cited, self.overlap_threshold);
        ClaimVerdict {
            claim_id: claim.claim_id.clone(),
            text: claim.text.clone(),
            citations,
            supported: heuristic.supported,
            support_rationale: heuristic.rationale,
            verification_tier: Tier::Heuristic,
        }
    }
}

/// A positive verdict must quote the evidence verbatim, modulo whitespace.
fn is_well_formed(verdict: &SupportVerdict, cited: &[&str]) -> bool {
    if !verdict.supported {
        return true;
    }

    let quote = collapse_whitespace(&verdict.quote);
    !quote.is_empty() && cited.iter().any(|text| collapse_whitespace(text).contains(&quote))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

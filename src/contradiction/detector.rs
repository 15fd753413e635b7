use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::heuristic::{STRONG_MODALS, heuristic_signals};
use super::types::{ContradictionConfidence, ContradictionRecord, ContradictionVerdict};
use crate::evidence::EvidenceItem;
use crate::judge::JudgeError;
use crate::verify::Tier;

/// Tier-2 contradiction judge for one pair of paragraphs.
#[async_trait]
pub trait ContradictionJudge: Send + Sync {
    async fn judge_pair(&self, a: &EvidenceItem, b: &EvidenceItem) -> Result<ContradictionVerdict, JudgeError>;
}

/// Pairwise conflict detection over an evidence list.
///
/// Heuristics always run. The judge, when present, is only asked about pairs
/// the heuristics found nothing in, and its failures count as no signal.
#[derive(Clone, Default)]
pub struct ContradictionDetector {
    judge: Option<Arc<dyn ContradictionJudge>>,
}

impl std::fmt::Debug for ContradictionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContradictionDetector")
            .field("has_judge", &self.judge.is_some())
            .finish()
    }
}

impl ContradictionDetector {
    pub fn heuristic() -> Self {
        Self { judge: None }
    }

    pub fn with_judge(mut self, judge: Arc<dyn ContradictionJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub async fn detect(&self, evidence: &[EvidenceItem]) -> Vec<ContradictionRecord> {
        let mut records = Vec::new();

        for (i, a) in evidence.iter().enumerate() {
            for b in &evidence[i + 1..] {
                if let Some(record) = self.check_pair(a, b).await {
                    records.push(record);
                }
            }
        }

        if records.is_empty() {
            debug!(pairs = pair_count(evidence.len()), "No contradictions detected");
        } else {
            info!(
                contradictions = records.len(),
                high = records
                    .iter()
                    .filter(|r| r.confidence == ContradictionConfidence::High)
                    .count(),
                "Detected potential contradictions"
            );
        }

        records
    }

    pub async fn check_pair(&self, a: &EvidenceItem, b: &EvidenceItem) -> Option<ContradictionRecord> {
        let mut signals = heuristic_signals(&a.text, &b.text);
        let mut judge_confirmed = false;

        if signals.is_empty()
            && let Some(judge) = &self.judge
        {
            match judge.judge_pair(a, b).await {
                Ok(verdict) if verdict.contradiction => {
                    let rationale = if verdict.rationale.trim().is_empty() {
                        "detected"
                    } else {
                        verdict.rationale.trim()
                    };
                    signals.push(format!("LLM: {rationale}"));
                    judge_confirmed = true;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        a = %a.paragraph_id,
                        b = %b.paragraph_id,
                        error = %e,
                        "Contradiction judge failed, treating as no signal"
                    );
                }
            }
        }

        if signals.is_empty() {
            return None;
        }

        Some(ContradictionRecord {
            paragraph_ids: [a.paragraph_id.clone(), b.paragraph_id.clone()],
            confidence: score_signals(&signals, judge_confirmed),
            rationale: signals.join("; "),
            tier: if judge_confirmed { Tier::Judge } else { Tier::Heuristic },
        })
    }
}

/// Two or more signals are `high`. A single judge confirmation or a single
/// signal over a strong modal is `med`. Anything else is `low`.
pub fn score_signals(signals: &[String], judge_confirmed: bool) -> ContradictionConfidence {
    if signals.len() >= 2 {
        ContradictionConfidence::High
    } else if judge_confirmed
        || signals
            .iter()
            .any(|s| STRONG_MODALS.iter().any(|m| s.contains(m)))
    {
        ContradictionConfidence::Med
    } else {
        ContradictionConfidence::Low
    }
}

fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

use tracing::info;

use super::types::{ContradictionConfidence, ContradictionPolicy, ContradictionRecord};
use crate::constants::{MAX_SURFACED_RATIONALES, is_refusal, notes};
use crate::verify::PolicyOutcome;

/// Applies `policy` to an answer given the contradictions in its evidence.
///
/// `AbstainOnHigh` refuses when any record is high confidence. With no such
/// record it behaves exactly like `Surface`: every conflicting paragraph is
/// cited and a caveat quoting up to three rationales is appended.
pub fn apply_contradiction_policy(
    answer: &str,
    citations: &[String],
    contradictions: &[ContradictionRecord],
    policy: ContradictionPolicy,
) -> PolicyOutcome {
    if is_refusal(answer) {
        return PolicyOutcome::unchanged(answer, &[]);
    }
    if contradictions.is_empty() {
        return PolicyOutcome::unchanged(answer, citations);
    }

    if policy == ContradictionPolicy::AbstainOnHigh
        && contradictions
            .iter()
            .any(|c| c.confidence == ContradictionConfidence::High)
    {
        info!(
            contradictions = contradictions.len(),
            "Abstaining: high-confidence contradiction in evidence"
        );
        return PolicyOutcome::refusal(notes::ABSTAINED_CONTRADICTION_HIGH);
    }

    let mut surfaced = citations.to_vec();
    for id in contradictions.iter().flat_map(|c| c.paragraph_ids.iter()) {
        if !surfaced.contains(id) {
            surfaced.push(id.clone());
        }
    }

    let summary = contradictions
        .iter()
        .take(MAX_SURFACED_RATIONALES)
        .map(|c| c.rationale.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    info!(
        contradictions = contradictions.len(),
        added_citations = surfaced.len() - citations.len(),
        "Surfacing contradictions in answer"
    );

    PolicyOutcome {
        answer: format!("{answer} Note: some evidence sources may conflict on this point ({summary})."),
        citations: surfaced,
        notes: vec![notes::CONTRADICTION_SURFACED.to_string()],
    }
}

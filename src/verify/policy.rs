use tracing::info;

use super::types::{PolicyOutcome, VerificationSummary};
use crate::constants::{is_refusal, notes};

/// Applies the minimum support rate to a verified answer.
///
/// Below the bar the whole answer is refused. At or above it, unsupported
/// claims are dropped and the answer is rebuilt from the supported claims'
/// text, with citations collected from those claims only. An answer with
/// nothing supported is left alone, which can only happen when the bar is zero.
pub fn enforce_support_policy(
    answer: &str,
    citations: &[String],
    summary: &VerificationSummary,
    min_support_rate: f32,
) -> PolicyOutcome {
    if is_refusal(answer) {
        return PolicyOutcome::unchanged(answer, &[]);
    }

    if summary.support_rate < min_support_rate {
        info!(
            support_rate = summary.support_rate,
            min_support_rate, "Abstaining: support rate below minimum"
        );
        return PolicyOutcome::refusal(notes::ABSTAINED_LOW_SUPPORT_RATE);
    }

    if summary.unsupported_claims == 0 || summary.supported_claims == 0 {
        return PolicyOutcome::unchanged(answer, citations);
    }

    let supported = summary.claims.iter().filter(|c| c.supported);

    let answer = supported
        .clone()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut rebuilt: Vec<String> = Vec::new();
    for id in supported.flat_map(|c| c.citations.iter()) {
        if !rebuilt.contains(id) {
            rebuilt.push(id.clone());
        }
    }

    info!(
        removed = summary.unsupported_claims,
        kept = summary.supported_claims,
        "Removed unsupported claims from answer"
    );

    PolicyOutcome {
        answer,
        citations: rebuilt,
        notes: vec![notes::UNSUPPORTED_CLAIMS_REMOVED.to_string()],
    }
}

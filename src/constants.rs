//! Cross-cutting, shared constants.
//!
//! Sentinel answers and note codes are part of the output contract: downstream
//! evaluation matches on these exact strings, so never reword them.

/// Refusal sentinel. An answer equal to this always carries empty citations.
pub const INSUFFICIENT_EVIDENCE: &str = "INSUFFICIENT_EVIDENCE";

/// Answer value recorded when the generation collaborator fails.
pub const ERROR_ANSWER: &str = "ERROR";

pub const DEFAULT_RETRIEVE_K: usize = 20;
pub const DEFAULT_RERANK_K: usize = 5;
pub const DEFAULT_ABSTAIN_THRESHOLD: f32 = 0.30;
pub const DEFAULT_MIN_SUPPORT_RATE: f32 = 0.80;
pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.10;

/// Raw model text kept as the answer when structured parsing fails twice.
pub const MAX_RAW_ANSWER_CHARS: usize = 500;

/// Contradiction rationales quoted in the surfaced note.
pub const MAX_SURFACED_RATIONALES: usize = 3;

/// Note codes attached to [`crate::pipeline::PipelineResult::notes`].
pub mod notes {
    pub const RERANK_FALLBACK: &str = "RERANK_FALLBACK";
    pub const RERANK_DISABLED: &str = "RERANK_DISABLED";
    pub const ABSTAINED_LOW_CONFIDENCE: &str = "ABSTAINED_LOW_CONFIDENCE";
    pub const VERIFY_DISABLED: &str = "VERIFY_DISABLED";
    pub const ABSTAINED_LOW_SUPPORT_RATE: &str = "ABSTAINED_LOW_SUPPORT_RATE";
    pub const UNSUPPORTED_CLAIMS_REMOVED: &str = "UNSUPPORTED_CLAIMS_REMOVED";
    pub const CONTRADICTIONS_DISABLED: &str = "CONTRADICTIONS_DISABLED";
    pub const ABSTAINED_CONTRADICTION_HIGH: &str = "ABSTAINED_CONTRADICTION_HIGH";
    pub const CONTRADICTION_SURFACED: &str = "CONTRADICTION_SURFACED";
    pub const JSON_PARSE_FAILED: &str = "JSON_PARSE_FAILED";
    pub const INVALID_CITATIONS_REMOVED: &str = "INVALID_CITATIONS_REMOVED";
    pub const NO_CITATIONS_GIVEN: &str = "NO_CITATIONS_GIVEN";
    pub const EXTRACTIVE_FALLBACK: &str = "EXTRACTIVE_FALLBACK";
    pub const FALLBACK_RELEVANCE_FAIL: &str = "FALLBACK_RELEVANCE_FAIL";
    pub const ERROR_PREFIX: &str = "ERROR";
}

/// Returns `true` if `answer` is the refusal sentinel.
#[inline]
pub fn is_refusal(answer: &str) -> bool {
    answer == INSUFFICIENT_EVIDENCE
}

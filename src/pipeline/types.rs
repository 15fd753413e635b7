use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::constants::{ERROR_ANSWER, INSUFFICIENT_EVIDENCE, is_refusal, notes};
use crate::contradiction::ContradictionRecord;
use crate::evidence::EvidenceItem;
use crate::gate::Confidence;
use crate::generate::GeneratedAnswer;
use crate::verify::VerificationSummary;

/// Wall-clock milliseconds per stage. A stage that did not run has no entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageTimings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_gen_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contradictions_ms: Option<f64>,
}

#[inline]
pub(crate) fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Terminal record for one query.
///
/// When `answer` is the refusal sentinel, `citations` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub citations: Vec<String>,
    pub confidence: Confidence,
    pub evidence: Vec<EvidenceItem>,
    /// Naive RAG only: what the model was shown, in retrieval order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved_paragraph_ids: Vec<String>,
    /// `None` when verification did not run.
    pub claim_verification: Option<VerificationSummary>,
    pub contradictions: Vec<ContradictionRecord>,
    pub notes: Vec<String>,
    #[serde(default)]
    pub timings: StageTimings,
}

impl PipelineResult {
    /// Confidence-gate refusal. Evidence and confidence are kept for diagnostics.
    pub fn abstained(
        confidence: Confidence,
        evidence: Vec<EvidenceItem>,
        notes: Vec<String>,
        timings: StageTimings,
    ) -> Self {
        Self {
            answer: INSUFFICIENT_EVIDENCE.to_string(),
            citations: Vec::new(),
            confidence,
            evidence,
            retrieved_paragraph_ids: Vec::new(),
            claim_verification: None,
            contradictions: Vec::new(),
            notes,
            timings,
        }
    }

    /// A baseline answer taken as generated, with no gate applied.
    pub fn ungated(generated: GeneratedAnswer, retrieved_paragraph_ids: Vec<String>, timings: StageTimings) -> Self {
        let citations = if is_refusal(&generated.answer) {
            Vec::new()
        } else {
            generated.citations
        };

        Self {
            answer: generated.answer,
            citations,
            confidence: Confidence::default(),
            evidence: Vec::new(),
            retrieved_paragraph_ids,
            claim_verification: None,
            contradictions: Vec::new(),
            notes: generated.notes,
            timings,
        }
    }

    /// A query that failed outright, recording `reason` as an `ERROR: ...` note.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            answer: ERROR_ANSWER.to_string(),
            citations: Vec::new(),
            confidence: Confidence::default(),
            evidence: Vec::new(),
            retrieved_paragraph_ids: Vec::new(),
            claim_verification: None,
            contradictions: Vec::new(),
            notes: vec![error_note(reason)],
            timings: StageTimings::default(),
        }
    }

    pub fn is_abstained(&self) -> bool {
        is_refusal(&self.answer)
    }

    pub fn is_error(&self) -> bool {
        self.answer == ERROR_ANSWER
    }

    /// Paragraph ids the answer could draw on: the ranked evidence, or the raw
    /// retrieval list when no evidence was ranked.
    pub fn retrieved_ids(&self) -> Vec<&str> {
        if self.evidence.is_empty() {
            self.retrieved_paragraph_ids.iter().map(String::as_str).collect()
        } else {
            self.evidence.iter().map(|e| e.paragraph_id.as_str()).collect()
        }
    }
}

pub(crate) fn error_note(reason: impl std::fmt::Display) -> String {
    format!("{}: {reason}", notes::ERROR_PREFIX)
}

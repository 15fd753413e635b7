//! Answer generation.
//!
//! A [`Generator`] turns a question and its ranked evidence into an answer
//! with inline `[CITATION: <paragraph_id>]` markers. [`LlmGenerator`] is the
//! model-backed path; [`ExtractiveGenerator`] runs offline and cannot answer
//! without evidence.

mod error;
mod extractive;
mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompts;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::INSUFFICIENT_EVIDENCE;
use crate::evidence::EvidenceItem;

pub use error::GenerationError;
pub use extractive::{ExtractiveGenerator, is_relevant_to_question};
pub use llm::{LlmGenerator, parse_answer, validate_citations};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;

/// Structured generation output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// Answer text, or the refusal sentinel.
    pub answer: String,
    pub citations: Vec<String>,
    pub notes: Vec<String>,
}

impl GeneratedAnswer {
    pub fn refusal() -> Self {
        Self {
            answer: INSUFFICIENT_EVIDENCE.to_string(),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Gated generation: every sentence must carry an inline citation.
    async fn generate(&self, question: &str, evidence: &[EvidenceItem]) -> Result<GeneratedAnswer, GenerationError>;

    /// Naive RAG generation over unranked evidence. Defaults to [`Generator::generate`].
    async fn generate_naive(
        &self,
        question: &str,
        evidence: &[EvidenceItem],
    ) -> Result<GeneratedAnswer, GenerationError> {
        self.generate(question, evidence).await
    }

    /// Answers from the question alone. The result never carries citations.
    async fn generate_prompt_only(&self, _question: &str) -> Result<GeneratedAnswer, GenerationError> {
        Err(GenerationError::PromptOnlyUnsupported)
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::error::GenerationError;
use super::prompts::{
    NAIVE_SYSTEM_PROMPT, PROMPT_ONLY_SYSTEM_PROMPT, REPAIR_PROMPT, SYSTEM_PROMPT, format_evidence_block,
    naive_user_prompt, prompt_only_user_prompt, user_prompt,
};
use super::{GeneratedAnswer, Generator};
use crate::constants::{MAX_RAW_ANSWER_CHARS, is_refusal, notes};
use crate::evidence::EvidenceItem;
use crate::judge::{LlmClient, parse_json_response};

/// Structured-output generator over an [`LlmClient`].
///
/// A reply that does not parse gets one repair round-trip. If the repaired
/// reply fails too, the raw text becomes the answer with `JSON_PARSE_FAILED`.
#[derive(Clone)]
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
}

impl std::fmt::Debug for LlmGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGenerator")
            .field("model", &self.client.model())
            .finish()
    }
}

impl LlmGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// One structured call: parse, repair once, else keep the raw text.
    async fn complete_structured(&self, system: &str, user: &str) -> Result<GeneratedAnswer, GenerationError> {
        let raw = self.client.complete(system, user).await?;

        let parsed = match parse_answer(&raw) {
            Some(parsed) => Some(parsed),
            None => self.repair(&raw).await,
        };

        Ok(parsed.unwrap_or_else(|| {
            error!("Could not parse generation reply as JSON, even after repair");
            GeneratedAnswer {
                answer: raw.chars().take(MAX_RAW_ANSWER_CHARS).collect(),
                citations: Vec::new(),
                notes: vec![notes::JSON_PARSE_FAILED.to_string()],
            }
        }))
    }

    async fn repair(&self, raw: &str) -> Option<GeneratedAnswer> {
        warn!("Generation reply was not valid JSON, sending repair prompt");

        match self.client.complete(REPAIR_PROMPT, raw).await {
            Ok(repaired) => parse_answer(&repaired),
            Err(e) => {
                warn!(error = %e, "Repair round-trip failed");
                None
            }
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, question: &str, evidence: &[EvidenceItem]) -> Result<GeneratedAnswer, GenerationError> {
        let user = user_prompt(&format_evidence_block(evidence), question);
        let answer = self.complete_structured(SYSTEM_PROMPT, &user).await?;

        let valid: HashSet<&str> = evidence.iter().map(|e| e.paragraph_id.as_str()).collect();
        Ok(validate_citations(answer, &valid))
    }

    async fn generate_naive(
        &self,
        question: &str,
        evidence: &[EvidenceItem],
    ) -> Result<GeneratedAnswer, GenerationError> {
        let user = naive_user_prompt(&format_evidence_block(evidence), question);
        let answer = self.complete_structured(NAIVE_SYSTEM_PROMPT, &user).await?;

        let valid: HashSet<&str> = evidence.iter().map(|e| e.paragraph_id.as_str()).collect();
        Ok(validate_citations(answer, &valid))
    }

    async fn generate_prompt_only(&self, question: &str) -> Result<GeneratedAnswer, GenerationError> {
        let mut answer = self
            .complete_structured(PROMPT_ONLY_SYSTEM_PROMPT, &prompt_only_user_prompt(question))
            .await?;
        answer.citations.clear();
        Ok(answer)
    }
}

/// Reads `{answer, citations, notes}` out of a model reply.
///
/// Citations may be plain ids or `{"paragraph_id": ...}` objects; anything
/// else is ignored. `notes` may be a string or a list of strings.
pub fn parse_answer(raw: &str) -> Option<GeneratedAnswer> {
    let value = parse_json_response(raw).ok()?;
    let answer = value.get("answer")?.as_str()?.trim().to_string();

    let citations = match value.get("citations") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id.trim().to_string()),
                Value::Object(obj) => obj.get("paragraph_id").map(|id| match id {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                }),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let notes = match value.get("notes") {
        Some(Value::String(note)) if !note.trim().is_empty() => vec![note.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Some(GeneratedAnswer {
        answer,
        citations,
        notes,
    })
}

/// Restricts citations to `valid` ids. A refusal never carries citations;
/// any other answer left without citations is flagged.
pub fn validate_citations(mut answer: GeneratedAnswer, valid: &HashSet<&str>) -> GeneratedAnswer {
    if is_refusal(&answer.answer) {
        answer.citations.clear();
        return answer;
    }

    let (kept, removed): (Vec<String>, Vec<String>) = answer
        .citations
        .into_iter()
        .partition(|id| valid.contains(id.as_str()));

    if !removed.is_empty() {
        warn!(removed = ?removed, "Removed citations not present in evidence");
        answer.notes.push(notes::INVALID_CITATIONS_REMOVED.to_string());
    }
    if kept.is_empty() {
        debug!("Answer carries no valid citations");
        answer.notes.push(notes::NO_CITATIONS_GIVEN.to_string());
    }

    answer.citations = kept;
    answer
}

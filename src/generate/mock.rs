use async_trait::async_trait;
use parking_lot::Mutex;

use super::{GeneratedAnswer, GenerationError, Generator};
use crate::evidence::EvidenceItem;

/// [`Generator`] that returns a fixed answer, or fails every call.
///
/// Records which entry point each call came through: `"gated"`, `"naive"`
/// or `"prompt_only"`.
#[derive(Debug)]
pub struct MockGenerator {
    reply: Result<GeneratedAnswer, String>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockGenerator {
    fn with_reply(reply: Result<GeneratedAnswer, String>) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(answer: impl Into<String>, citations: &[&str]) -> Self {
        Self::with_reply(Ok(GeneratedAnswer {
            answer: answer.into(),
            citations: citations.iter().map(|c| c.to_string()).collect(),
            notes: Vec::new(),
        }))
    }

    pub fn refusing() -> Self {
        Self::with_reply(Ok(GeneratedAnswer::refusal()))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_reply(Err(reason.into()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn modes(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn reply(&self, mode: &'static str) -> Result<GeneratedAnswer, GenerationError> {
        self.calls.lock().push(mode);
        self.reply
            .clone()
            .map_err(|reason| GenerationError::Failed { reason })
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _question: &str, _evidence: &[EvidenceItem]) -> Result<GeneratedAnswer, GenerationError> {
        self.reply("gated")
    }

    async fn generate_naive(
        &self,
        _question: &str,
        _evidence: &[EvidenceItem],
    ) -> Result<GeneratedAnswer, GenerationError> {
        self.reply("naive")
    }

    async fn generate_prompt_only(&self, _question: &str) -> Result<GeneratedAnswer, GenerationError> {
        let mut answer = self.reply("prompt_only")?;
        answer.citations.clear();
        Ok(answer)
    }
}

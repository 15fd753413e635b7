use thiserror::Error;

use crate::judge::LlmError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("generation failed: {reason}")]
    Failed { reason: String },

    #[error("prompt-only generation needs a language model")]
    PromptOnlyUnsupported,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<genai::Error> for LlmError {
    fn from(err: genai::Error) -> Self {
        LlmError::RequestFailed {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("malformed judge response: {reason}")]
    MalformedResponse { reason: String },

    #[error("judge cache error: {reason}")]
    Cache { reason: String },
}

impl From<serde_json::Error> for JudgeError {
    fn from(err: serde_json::Error) -> Self {
        JudgeError::MalformedResponse {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for JudgeError {
    fn from(err: std::io::Error) -> Self {
        JudgeError::Cache {
            reason: err.to_string(),
        }
    }
}

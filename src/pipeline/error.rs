use thiserror::Error;

use crate::retrieval::SearchError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The search backend failed. Nothing downstream can run without candidates.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] SearchError),

    #[error("batch I/O failed: {reason}")]
    Io { reason: String },

    #[error("malformed query record at line {line}: {reason}")]
    InvalidQuery { line: usize, reason: String },
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Io {
            reason: err.to_string(),
        }
    }
}

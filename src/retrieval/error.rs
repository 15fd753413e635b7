use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("corpus file not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    #[error("failed to load corpus: {reason}")]
    CorpusLoad { reason: String },

    #[error("search backend failed: {reason}")]
    Backend { reason: String },
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::CorpusLoad {
            reason: err.to_string(),
        }
    }
}

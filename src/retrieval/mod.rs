//! Candidate retrieval.

mod bm25;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


use async_trait::async_trait;

use crate::evidence::Candidate;

pub use bm25::{Bm25Index, Paragraph};
pub use error::SearchError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSearchBackend;

/// Search collaborator: the top `k` candidates for `query`, best first.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Candidate>, SearchError>;
}

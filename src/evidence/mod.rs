//! Evidence reranking.
//!
//! Retrieval [`Candidate`]s go in, ranked [`EvidenceItem`]s come out. The
//! cross-encoder path and the retrieval-score fallback are both first-class:
//! the fallback is what runs when no model is configured, when the model
//! errors, or when it returns a malformed score vector.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rerank;
pub mod types;


#[cfg(any(test, feature = "mock"))]
pub use mock::MockScorer;
pub use rerank::{EvidenceReranker, RelevanceScorer, RerankOutcome, passthrough, rank_by_retrieval};
pub use types::{Candidate, EvidenceItem, sigmoid};

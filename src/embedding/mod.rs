//! Model utilities for relevance scoring.
//!
//! - [`reranker`] provides the cross-encoder used by [`crate::evidence::EvidenceReranker`].

/// Sequence-classification head over a BERT encoder.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Cross-encoder reranker.
pub mod reranker;
/// Tokenizer loading helpers.
pub mod tokenizer;

pub use error::EmbeddingError;
pub use reranker::{DEFAULT_MAX_SEQ_LEN, Reranker, RerankerConfig, RerankerError};

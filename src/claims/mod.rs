//! Claim splitting.
//!
//! An answer is decomposed into sentence-level [`Claim`]s, each carrying the
//! `[CITATION: <paragraph_id>]` markers that appeared inside it.

mod split;


use serde::{Deserialize, Serialize};

pub use split::{extract_all_citations, split_claims};

/// One atomic, citation-tagged assertion taken from an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Sequential id: `c0000`, `c0001`, ...
    pub claim_id: String,
    pub text: String,
    /// Cited paragraph ids in first-seen order, without duplicates.
    pub citations: Vec<String>,
}

impl Claim {
    pub fn new(index: usize, text: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            claim_id: claim_id(index),
            text: text.into(),
            citations,
        }
    }
}

#[inline]
pub fn claim_id(index: usize) -> String {
    format!("c{index:04}")
}

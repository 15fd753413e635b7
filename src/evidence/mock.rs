//! Deterministic relevance scorers for tests.

use std::collections::HashSet;

use crate::embedding::RerankerError;

use super::rerank::RelevanceScorer;

#[derive(Debug, Clone)]
enum Behavior {
    Fixed(Vec<f32>),
    KeywordOverlap,
    Fail,
    Unavailable,
}

/// Mock [`RelevanceScorer`].
#[derive(Debug, Clone)]
pub struct MockScorer {
    behavior: Behavior,
}

impl MockScorer {
    /// Returns `logits` verbatim (length mismatches are passed through too).
    pub fn with_logits(logits: Vec<f32>) -> Self {
        Self {
            behavior: Behavior::Fixed(logits),
        }
    }

    /// Logit = shared lowercase words between query and passage, minus 2.
    pub fn keyword_overlap() -> Self {
        Self {
            behavior: Behavior::KeywordOverlap,
        }
    }

    /// Every call fails with an inference error.
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
        }
    }

    /// Reports itself unavailable, like a reranker with no model loaded.
    pub fn unavailable() -> Self {
        Self {
            behavior: Behavior::Unavailable,
        }
    }
}

impl RelevanceScorer for MockScorer {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankerError> {
        match &self.behavior {
            Behavior::Fixed(logits) => Ok(logits.clone()),
            Behavior::KeywordOverlap => {
                let query_words = words(query);
                Ok(passages
                    .iter()
                    .map(|p| words(p).intersection(&query_words).count() as f32 - 2.0)
                    .collect())
            }
            Behavior::Fail => Err(RerankerError::InferenceFailed {
                reason: "mock scorer failure".to_string(),
            }),
            Behavior::Unavailable => Err(RerankerError::NotAvailable {
                reason: "mock scorer unavailable".to_string(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self.behavior, Behavior::Unavailable)
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

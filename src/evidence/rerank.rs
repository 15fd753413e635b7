use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::embedding::{Reranker, RerankerError};

use super::types::{Candidate, EvidenceItem};

/// Secondary relevance model consumed by [`EvidenceReranker`].
pub trait RelevanceScorer: Send + Sync {
    /// Returns one raw logit per passage, in input order.
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankerError>;

    /// `false` lets the adapter skip straight to the fallback path.
    fn is_available(&self) -> bool {
        true
    }
}

impl RelevanceScorer for Reranker {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankerError> {
        self.score_batch(query, passages)
    }

    fn is_available(&self) -> bool {
        self.is_model_loaded()
    }
}

/// Output of [`EvidenceReranker::rerank`].
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    pub evidence: Vec<EvidenceItem>,
    /// `true` when `score_rerank` is a copy of `score_retrieve`.
    pub fell_back: bool,
}

/// Turns retrieval candidates into ranked, normalized evidence.
///
/// With a scorer, `score_rerank = sigmoid(logit)`. Without one, or when the
/// scorer fails, the retrieval score is copied and the outcome is flagged.
#[derive(Clone, Default)]
pub struct EvidenceReranker {
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl std::fmt::Debug for EvidenceReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceReranker")
            .field("has_scorer", &self.scorer.is_some())
            .finish()
    }
}

impl EvidenceReranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self {
            scorer: Some(scorer),
        }
    }

    /// An adapter that always takes the retrieval-score path.
    pub fn retrieval_only() -> Self {
        Self { scorer: None }
    }

    pub fn has_scorer(&self) -> bool {
        self.scorer.as_ref().is_some_and(|s| s.is_available())
    }

    /// Scores on the blocking pool so a forward pass never stalls the runtime.
    pub async fn rerank(&self, query: &str, candidates: Vec<Candidate>, top_k: usize) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome {
                evidence: Vec::new(),
                fell_back: !self.has_scorer(),
            };
        }

        let scorer = match &self.scorer {
            Some(scorer) if scorer.is_available() => Arc::clone(scorer),
            _ => {
                warn!("Relevance scorer unavailable, ranking by retrieval score");
                return fallback(candidates, top_k);
            }
        };

        let query = query.to_string();
        let passages: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let scored = tokio::task::spawn_blocking(move || {
            let passages: Vec<&str> = passages.iter().map(String::as_str).collect();
            scorer.score(&query, &passages)
        })
        .await;

        let logits = match scored {
            Ok(Ok(logits)) if logits.len() == candidates.len() => logits,
            Ok(Ok(logits)) => {
                warn!(
                    expected = candidates.len(),
                    got = logits.len(),
                    "Relevance scorer returned wrong number of scores, ranking by retrieval score"
                );
                return fallback(candidates, top_k);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Relevance scoring failed, ranking by retrieval score");
                return fallback(candidates, top_k);
            }
            Err(e) => {
                warn!(error = %e, "Relevance scoring task panicked, ranking by retrieval score");
                return fallback(candidates, top_k);
            }
        };

        let total = candidates.len();
        let mut evidence: Vec<EvidenceItem> = candidates
            .into_iter()
            .zip(logits)
            .map(|(candidate, raw)| EvidenceItem::from_scored(candidate, raw))
            .collect();

        sort_by_rerank_desc(&mut evidence);
        evidence.truncate(top_k);

        info!(
            candidates = total,
            kept = evidence.len(),
            top_score = evidence.first().map(|e| e.score_rerank),
            "Reranked evidence"
        );

        RerankOutcome {
            evidence,
            fell_back: false,
        }
    }
}

fn fallback(candidates: Vec<Candidate>, top_k: usize) -> RerankOutcome {
    RerankOutcome {
        evidence: rank_by_retrieval(candidates, top_k),
        fell_back: true,
    }
}

/// Fallback ranking: copy `score_retrieve` into `score_rerank`, sort descending, keep `top_k`.
pub fn rank_by_retrieval(candidates: Vec<Candidate>, top_k: usize) -> Vec<EvidenceItem> {
    let mut evidence: Vec<EvidenceItem> = candidates
        .into_iter()
        .map(EvidenceItem::from_retrieval)
        .collect();

    sort_by_rerank_desc(&mut evidence);
    evidence.truncate(top_k);
    evidence
}

/// Rerank stage disabled: keep retrieval order, copy scores, keep `top_k`.
pub fn passthrough(candidates: Vec<Candidate>, top_k: usize) -> Vec<EvidenceItem> {
    debug!(candidates = candidates.len(), top_k, "Rerank disabled, passing retrieval order through");

    candidates
        .into_iter()
        .take(top_k)
        .map(EvidenceItem::from_retrieval)
        .collect()
}

// Vec::sort_by is stable, so equal scores keep candidate order.
fn sort_by_rerank_desc(evidence: &mut [EvidenceItem]) {
    evidence.sort_by(|a, b| {
        b.score_rerank
            .partial_cmp(&a.score_rerank)
            .unwrap_or(Ordering::Equal)
    });
}

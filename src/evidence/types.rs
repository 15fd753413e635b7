use serde::{Deserialize, Serialize};

/// A raw retrieval hit, before reranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub paragraph_id: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub page: u32,
    pub text: String,
    /// Retrieval-stage relevance, higher is better.
    pub score: f32,
}

impl Candidate {
    pub fn new(
        paragraph_id: impl Into<String>,
        doc_id: impl Into<String>,
        page: u32,
        text: impl Into<String>,
        score: f32,
    ) -> Self {
        Self {
            paragraph_id: paragraph_id.into(),
            doc_id: doc_id.into(),
            page,
            text: text.into(),
            score,
        }
    }
}

/// A ranked evidence paragraph. Identity is `paragraph_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub paragraph_id: String,
    pub doc_id: String,
    pub page: u32,
    pub text: String,
    pub score_retrieve: f32,
    pub score_rerank: f32,
    /// Unsquashed cross-encoder logit, when a scoring model produced `score_rerank`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_rerank_raw: Option<f32>,
}

impl EvidenceItem {
    /// Evidence whose rerank score is a copy of the retrieval score.
    pub fn from_retrieval(candidate: Candidate) -> Self {
        Self {
            score_retrieve: candidate.score,
            score_rerank: candidate.score,
            score_rerank_raw: None,
            paragraph_id: candidate.paragraph_id,
            doc_id: candidate.doc_id,
            page: candidate.page,
            text: candidate.text,
        }
    }

    /// Evidence scored by a cross-encoder; `raw` is the model logit.
    pub fn from_scored(candidate: Candidate, raw: f32) -> Self {
        Self {
            score_rerank: sigmoid(raw),
            score_rerank_raw: Some(raw),
            ..Self::from_retrieval(candidate)
        }
    }
}

/// Logistic squashing of an unbounded logit into `(0, 1)`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::SearchBackend;
use super::error::SearchError;
use crate::evidence::Candidate;

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// One line of the paragraphs JSONL corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct Paragraph {
    #[serde(alias = "id")]
    pub paragraph_id: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub page: u32,
    pub text: String,
}

/// In-memory Okapi BM25 over lowercase whitespace tokens.
///
/// Scores are divided by the best score for the query, so the top hit is
/// `1.0` whenever anything matched at all.
#[derive(Debug, Default)]
pub struct Bm25Index {
    paragraphs: Vec<Paragraph>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<f32>,
    doc_freqs: HashMap<String, u32>,
    avg_doc_len: f32,
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

impl Bm25Index {
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        let mut term_freqs = Vec::with_capacity(paragraphs.len());
        let mut doc_lens = Vec::with_capacity(paragraphs.len());
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();

        for paragraph in &paragraphs {
            let mut freqs: HashMap<String, u32> = HashMap::new();
            let mut len = 0u32;
            for token in tokenize(&paragraph.text) {
                *freqs.entry(token).or_default() += 1;
                len += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(freqs);
            doc_lens.push(len as f32);
        }

        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<f32>() / doc_lens.len() as f32
        };

        Self {
            paragraphs,
            term_freqs,
            doc_lens,
            doc_freqs,
            avg_doc_len,
        }
    }

    /// Loads a JSONL file of `{paragraph_id | id, doc_id, page, text}` records.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SearchError::CorpusNotFound {
                path: path.to_path_buf(),
            });
        }

        let reader = BufReader::new(File::open(path)?);
        let mut paragraphs = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let paragraph: Paragraph = serde_json::from_str(&line).map_err(|e| SearchError::CorpusLoad {
                reason: format!("{}:{}: {e}", path.display(), line_no + 1),
            })?;
            paragraphs.push(paragraph);
        }

        info!(path = %path.display(), paragraphs = paragraphs.len(), "Built BM25 index");
        Ok(Self::from_paragraphs(paragraphs))
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.paragraphs.len() as f32;
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Raw BM25 score of every paragraph for `query`, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let terms: Vec<(String, f32)> = tokenize(query)
            .map(|t| {
                let idf = self.idf(&t);
                (t, idf)
            })
            .collect();

        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &len)| {
                let norm = K1 * (1.0 - B + B * len / self.avg_doc_len.max(f32::EPSILON));
                terms
                    .iter()
                    .map(|(term, idf)| {
                        let tf = freqs.get(term).copied().unwrap_or(0) as f32;
                        idf * tf * (K1 + 1.0) / (tf + norm)
                    })
                    .sum()
            })
            .collect()
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<Candidate> {
        let scores = self.scores(query);
        let max = scores.iter().copied().fold(0.0_f32, f32::max);
        let max = if max <= 1e-9 { 1.0 } else { max };

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
        order.truncate(k);

        debug!(query_len = query.len(), k, hits = order.len(), "BM25 search");

        order
            .into_iter()
            .map(|i| {
                let p = &self.paragraphs[i];
                Candidate::new(p.paragraph_id.clone(), p.doc_id.clone(), p.page, p.text.clone(), scores[i] / max)
            })
            .collect()
    }
}

#[async_trait]
impl SearchBackend for Bm25Index {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Candidate>, SearchError> {
        Ok(self.search(query, k))
    }
}

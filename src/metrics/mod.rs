//! Evaluation metrics over a finished batch.
//!
//! Queries labelled `answerable`, `unanswerable` or `contradiction` feed the
//! answer, abstention and citation figures. Any query carrying gold paragraph
//! ids feeds the retrieval figures. Unlabelled queries only count towards
//! the total.


use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{ERROR_ANSWER, INSUFFICIENT_EVIDENCE};
use crate::pipeline::BatchRecord;

/// Answers that never count as answered.
pub const NON_ANSWERS: &[&str] = &[INSUFFICIENT_EVIDENCE, ERROR_ANSWER];

/// Cut-off for the evidence recall and precision figures.
pub const EVIDENCE_K: usize = 5;

pub const CATEGORY_ANSWERABLE: &str = "answerable";
pub const CATEGORY_UNANSWERABLE: &str = "unanswerable";

pub fn is_answered(answer: &str) -> bool {
    let answer = answer.trim();
    !answer.is_empty() && !NON_ANSWERS.contains(&answer)
}

/// Fraction of queries whose abstain decision matches the expected one.
pub fn abstention_accuracy(predicted: &[bool], expected: &[bool]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    correct as f64 / predicted.len() as f64
}

/// Fraction of citations that point into the retrieved set. No citations scores zero.
pub fn citation_precision(cited: &[&str], retrieved: &[&str]) -> f64 {
    if cited.is_empty() {
        return 0.0;
    }
    let retrieved: HashSet<&str> = retrieved.iter().copied().collect();
    let valid = cited.iter().filter(|c| retrieved.contains(*c)).count();
    valid as f64 / cited.len() as f64
}

/// Fraction of gold ids that were cited. No gold ids scores one.
pub fn citation_recall(cited: &[&str], gold: &[&str]) -> f64 {
    if gold.is_empty() {
        return 1.0;
    }
    let cited: HashSet<&str> = cited.iter().copied().collect();
    let found = gold.iter().filter(|g| cited.contains(*g)).count();
    found as f64 / gold.len() as f64
}

pub fn recall_at_k(retrieved: &[&str], gold: &[&str], k: usize) -> f64 {
    if gold.is_empty() {
        return 1.0;
    }
    let top: HashSet<&str> = retrieved.iter().take(k).copied().collect();
    let found = gold.iter().filter(|g| top.contains(*g)).count();
    found as f64 / gold.len() as f64
}

pub fn precision_at_k(retrieved: &[&str], gold: &[&str], k: usize) -> f64 {
    let top: Vec<&str> = retrieved.iter().take(k).copied().collect();
    if top.is_empty() {
        return 0.0;
    }
    let gold: HashSet<&str> = gold.iter().copied().collect();
    let relevant = top.iter().filter(|r| gold.contains(*r)).count();
    relevant as f64 / top.len() as f64
}

/// Reciprocal rank of the first gold id in `retrieved`.
pub fn mrr(retrieved: &[&str], gold: &[&str]) -> f64 {
    if gold.is_empty() {
        return 1.0;
    }
    let gold: HashSet<&str> = gold.iter().copied().collect();
    retrieved
        .iter()
        .position(|r| gold.contains(r))
        .map_or(0.0, |rank| 1.0 / (rank + 1) as f64)
}

/// Share of verified claims that were unsupported, over answered records.
///
/// `None` when no record went through verification at all.
pub fn ungrounded_rate(records: &[BatchRecord]) -> Option<f64> {
    let verified: Vec<&BatchRecord> = records
        .iter()
        .filter(|r| r.result.claim_verification.is_some())
        .collect();
    if verified.is_empty() {
        return None;
    }

    let (total, unsupported) = verified
        .iter()
        .filter(|r| !r.is_abstained)
        .filter_map(|r| r.result.claim_verification.as_ref())
        .fold((0usize, 0usize), |(total, unsupported), summary| {
            (
                total + summary.supported_claims + summary.unsupported_claims,
                unsupported + summary.unsupported_claims,
            )
        });

    if total == 0 {
        return Some(0.0);
    }
    Some(unsupported as f64 / total as f64)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn has_category(record: &BatchRecord, category: &str) -> bool {
    record.category.as_deref() == Some(category)
}

/// Run-level figures. A figure whose subset is empty is left out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total_queries: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_rate: Option<f64>,
    /// Over `unanswerable` queries, where refusing is correct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstention_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_recall_at_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_precision_at_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_mrr: Option<f64>,
    /// Over answered `answerable` queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_precision: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_recall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungrounded_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_rate_mean: Option<f64>,
}

impl EvalSummary {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        let answerable: Vec<&BatchRecord> = records
            .iter()
            .filter(|r| has_category(r, CATEGORY_ANSWERABLE))
            .collect();
        let answered: Vec<&BatchRecord> = answerable
            .iter()
            .copied()
            .filter(|r| is_answered(&r.result.answer))
            .collect();
        let unanswerable: Vec<bool> = records
            .iter()
            .filter(|r| has_category(r, CATEGORY_UNANSWERABLE))
            .map(|r| r.is_abstained)
            .collect();

        let mut recalls = Vec::new();
        let mut precisions = Vec::new();
        let mut mrrs = Vec::new();
        for record in records.iter().filter(|r| !r.gold_paragraph_ids.is_empty()) {
            let retrieved = record.result.retrieved_ids();
            let gold: Vec<&str> = record.gold_paragraph_ids.iter().map(String::as_str).collect();
            recalls.push(recall_at_k(&retrieved, &gold, EVIDENCE_K));
            precisions.push(precision_at_k(&retrieved, &gold, EVIDENCE_K));
            mrrs.push(mrr(&retrieved, &gold));
        }

        let mut citation_precisions = Vec::new();
        let mut citation_recalls = Vec::new();
        let mut support_rates = Vec::new();
        for record in &answered {
            let cited: Vec<&str> = record.result.citations.iter().map(String::as_str).collect();
            let gold: Vec<&str> = record.gold_paragraph_ids.iter().map(String::as_str).collect();
            citation_precisions.push(citation_precision(&cited, &record.result.retrieved_ids()));
            citation_recalls.push(citation_recall(&cited, &gold));
            if let Some(summary) = &record.result.claim_verification {
                support_rates.push(f64::from(summary.support_rate));
            }
        }

        Self {
            total_queries: records.len(),
            answer_rate: (!answerable.is_empty()).then(|| answered.len() as f64 / answerable.len() as f64),
            abstention_accuracy: (!unanswerable.is_empty())
                .then(|| abstention_accuracy(&unanswerable, &vec![true; unanswerable.len()])),
            evidence_recall_at_5: mean(&recalls),
            evidence_precision_at_5: mean(&precisions),
            evidence_mrr: mean(&mrrs),
            citation_precision: mean(&citation_precisions),
            citation_recall: mean(&citation_recalls),
            ungrounded_rate: ungrounded_rate(records),
            support_rate_mean: mean(&support_rates),
        }
    }
}

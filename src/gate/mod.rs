//! Confidence gate.
//!
//! Derives a scalar confidence from ranked evidence and decides refusal before
//! any generation cost is spent.


use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::DEFAULT_ABSTAIN_THRESHOLD;
use crate::evidence::EvidenceItem;

/// Confidence signal derived from a ranked evidence list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Confidence {
    pub max_rerank: f32,
    /// Mean of the top three `score_rerank` values (fewer if fewer exist).
    pub mean_top3_rerank: f32,
}

pub fn compute_confidence(evidence: &[EvidenceItem]) -> Confidence {
    if evidence.is_empty() {
        return Confidence::default();
    }

    let mut scores: Vec<f32> = evidence.iter().map(|e| e.score_rerank).collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let top3 = &scores[..scores.len().min(3)];
    let mean_top3_rerank = top3.iter().sum::<f32>() / top3.len() as f32;

    Confidence {
        max_rerank: scores[0],
        mean_top3_rerank,
    }
}

/// Strict: a `max_rerank` exactly at `threshold` does not abstain.
pub fn should_abstain(confidence: &Confidence, threshold: f32) -> bool {
    if confidence.max_rerank < threshold {
        info!(
            max_rerank = confidence.max_rerank,
            threshold, "Abstaining: top evidence below confidence threshold"
        );
        return true;
    }

    debug!(
        max_rerank = confidence.max_rerank,
        threshold, "Confidence gate passed"
    );
    false
}

/// One dev-set observation for [`calibrate_threshold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub max_rerank: f32,
    /// Ground truth: the query has no answer in the corpus.
    pub unanswerable: bool,
}

/// Sweeps 0.05..=0.95 in 0.05 steps and returns the threshold maximising
/// abstention F1 on unanswerable queries.
///
/// Fewer than five observations, or no threshold with positive F1, yields
/// [`DEFAULT_ABSTAIN_THRESHOLD`]. Ties keep the lowest threshold.
pub fn calibrate_threshold(points: &[CalibrationPoint]) -> f32 {
    if points.len() < 5 {
        return DEFAULT_ABSTAIN_THRESHOLD;
    }

    let mut best_f1 = 0.0_f32;
    let mut best_threshold = DEFAULT_ABSTAIN_THRESHOLD;

    for step in (5..=95).step_by(5) {
        let threshold = step as f32 / 100.0;

        let (mut tp, mut fp, mut fn_) = (0u32, 0u32, 0u32);
        for point in points {
            let abstains = point.max_rerank < threshold;
            match (abstains, point.unanswerable) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        if f1 > best_f1 {
            best_f1 = f1;
            best_threshold = threshold;
        }
    }

    info!(threshold = best_threshold, f1 = best_f1, "Calibrated abstain threshold");
    best_threshold
}

fn ratio(num: u32, den: u32) -> f32 {
    if den == 0 { 0.0 } else { num as f32 / den as f32 }
}

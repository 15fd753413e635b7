use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "shall", "can", "to",
    "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through", "during",
    "before", "after", "and", "but", "or", "nor", "not", "so", "yet", "both", "either", "neither",
    "each", "every", "all", "any", "few", "more", "most", "other", "some", "such", "no", "only",
    "own", "same", "than", "too", "very", "it", "its", "this", "that", "these", "those", "i", "me",
    "my", "we", "our", "you", "your", "he", "him", "his", "she", "her", "they", "them", "their",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

pub const NO_CITED_PARAGRAPHS: &str = "no cited paragraphs";

/// Tier-1 verdict for one claim.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicVerdict {
    pub supported: bool,
    pub jaccard: f32,
    pub numeric_match: bool,
    pub rationale: String,
}

/// Lowercased word set with stopwords removed.
pub fn content_tokens(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    RE_WORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| !STOPWORD_SET.contains(w))
        .map(str::to_string)
        .collect()
}

/// Integer and decimal literals in `text`.
pub fn numeric_tokens(text: &str) -> HashSet<String> {
    RE_NUMBER
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keyword-overlap check of `claim` against the union of `cited_texts`.
///
/// Supported iff the Jaccard similarity of content words reaches
/// `overlap_threshold`, or the claim shares at least one number with the
/// evidence. No cited text means unsupported. A claim made only of stopwords
/// has nothing to contradict and is supported.
pub fn verify_heuristic(claim: &str, cited_texts: &[&str], overlap_threshold: f32) -> HeuristicVerdict {
    if cited_texts.is_empty() {
        return HeuristicVerdict {
            supported: false,
            jaccard: 0.0,
            numeric_match: false,
            rationale: NO_CITED_PARAGRAPHS.to_string(),
        };
    }

    let claim_tokens = content_tokens(claim);
    if claim_tokens.is_empty() {
        return HeuristicVerdict {
            supported: true,
            jaccard: 1.0,
            numeric_match: false,
            rationale: "empty claim tokens".to_string(),
        };
    }

    let mut evidence_tokens = HashSet::new();
    let mut evidence_numbers = HashSet::new();
    for text in cited_texts {
        evidence_tokens.extend(content_tokens(text));
        evidence_numbers.extend(numeric_tokens(text));
    }

    let intersection = claim_tokens.intersection(&evidence_tokens).count();
    let union = claim_tokens.union(&evidence_tokens).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    };

    let numeric_match = numeric_tokens(claim)
        .iter()
        .any(|n| evidence_numbers.contains(n));

    let mut rationale = format!("Jaccard={jaccard:.3}");
    if numeric_match {
        rationale.push_str(", numeric_match");
    }

    HeuristicVerdict {
        supported: jaccard >= overlap_threshold || numeric_match,
        jaccard,
        numeric_match,
        rationale,
    }
}

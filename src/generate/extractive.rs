use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use super::error::GenerationError;
use super::{GeneratedAnswer, Generator};
use crate::constants::notes;
use crate::evidence::EvidenceItem;

const MAX_EXTRACT_CHARS: usize = 2000;
const MIN_KEYWORD_LEN: usize = 3;
const MIN_SHARED_KEYWORDS: usize = 2;
const MIN_SHARED_RATIO: f32 = 0.25;

static RE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());
static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

const QUESTION_STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "will", "would", "shall", "should", "may", "might",
    "must", "can", "could", "and", "but", "or", "nor", "not", "no", "so", "if", "then", "than",
    "that", "this", "these", "those", "what", "which", "who", "whom", "how", "when", "where", "why",
    "its", "his", "her", "their", "our", "for", "from", "into", "with", "about", "between",
    "through", "during", "before", "after", "above", "below", "to", "of", "in", "on", "at", "by",
    "all", "each", "every", "any", "few", "more", "most", "some", "such",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| QUESTION_STOPWORDS.iter().copied().collect());

/// Offline generator: quotes the top evidence paragraph verbatim.
///
/// Each sentence gets an inline citation before its final punctuation so the
/// claim splitter keeps the citation with the sentence. A paragraph that
/// shares too few keywords with the question is refused instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn generate(&self, question: &str, evidence: &[EvidenceItem]) -> Result<GeneratedAnswer, GenerationError> {
        let Some(top) = evidence.first() else {
            return Ok(GeneratedAnswer::refusal());
        };

        if !is_relevant_to_question(question, &top.text) {
            info!(paragraph_id = %top.paragraph_id, "Top evidence fails relevance check, refusing");
            return Ok(GeneratedAnswer {
                notes: vec![notes::FALLBACK_RELEVANCE_FAIL.to_string()],
                ..GeneratedAnswer::refusal()
            });
        }

        Ok(GeneratedAnswer {
            answer: annotate_sentences(&top.text, &top.paragraph_id),
            citations: vec![top.paragraph_id.clone()],
            notes: vec![notes::EXTRACTIVE_FALLBACK.to_string()],
        })
    }
}

fn keywords(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    RE_KEYWORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= MIN_KEYWORD_LEN && !STOPWORD_SET.contains(w))
        .map(str::to_string)
        .collect()
}

/// At least two shared keywords, or a quarter of the question's keywords.
/// A question with no keywords passes.
pub fn is_relevant_to_question(question: &str, paragraph: &str) -> bool {
    let asked = keywords(question);
    if asked.is_empty() {
        return true;
    }

    let shared = asked.intersection(&keywords(paragraph)).count();
    shared >= MIN_SHARED_KEYWORDS || shared as f32 / asked.len() as f32 >= MIN_SHARED_RATIO
}

fn annotate_sentences(text: &str, paragraph_id: &str) -> String {
    let text: String = text.chars().take(MAX_EXTRACT_CHARS).collect();

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(&text) {
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.char_indices().last() {
            Some((i, last @ ('.' | '!' | '?'))) => {
                format!("{} [CITATION: {paragraph_id}]{last}", &s[..i])
            }
            _ => format!("{s} [CITATION: {paragraph_id}]."),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Claim;
use crate::constants::is_refusal;

static RE_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[CITATION:\s*([^\]]+)\]").unwrap());
static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__CITE(\d+)__").unwrap());
static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.!?,;:])").unwrap());
static RE_ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*[.)]?\s*$").unwrap());

const MIN_CLAIM_CHARS: usize = 3;

/// Splits `answer` into sentence-level claims.
///
/// Citation markers are swapped for positional placeholders before sentence
/// splitting so punctuation inside an id cannot break a sentence. A fragment
/// holding only markers is folded into the previous sentence. Fragments that
/// end up empty, shorter than three characters, or bare list numbering such
/// as `13.` are dropped.
pub fn split_claims(answer: &str) -> Vec<Claim> {
    if answer.trim().is_empty() || is_refusal(answer) {
        return Vec::new();
    }

    let mut cited: Vec<String> = Vec::new();
    let masked = RE_CITATION.replace_all(answer, |caps: &Captures<'_>| {
        cited.push(caps[1].trim().to_string());
        format!("__CITE{}__", cited.len() - 1)
    });

    let mut fragments: Vec<String> = Vec::new();
    for sentence in split_sentences(masked.trim()) {
        let visible = RE_PLACEHOLDER.replace_all(sentence, "");
        match fragments.last_mut() {
            Some(previous) if visible.trim().is_empty() => {
                previous.push(' ');
                previous.push_str(sentence);
            }
            _ => fragments.push(sentence.to_string()),
        }
    }

    let mut claims = Vec::new();
    for fragment in &fragments {
        let mut citations: Vec<String> = Vec::new();
        for caps in RE_PLACEHOLDER.captures_iter(fragment) {
            let Some(id) = caps[1].parse::<usize>().ok().and_then(|i| cited.get(i)) else {
                continue;
            };
            if !citations.contains(id) {
                citations.push(id.clone());
            }
        }

        let text = clean_text(&RE_PLACEHOLDER.replace_all(fragment, ""));
        if text.chars().count() < MIN_CLAIM_CHARS || RE_ENUMERATION.is_match(&text) {
            continue;
        }

        claims.push(Claim::new(claims.len(), text, citations));
    }

    claims
}

/// All citation targets in `answer`, deduplicated in first-seen order.
pub fn extract_all_citations(answer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_CITATION
        .captures_iter(answer)
        .map(|caps| caps[1].trim().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in RE_SENTENCE_END.find_iter(text) {
        // The punctuation mark is a single ASCII byte.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

fn clean_text(text: &str) -> String {
    let collapsed = RE_WHITESPACE.replace_all(text, " ");
    RE_SPACE_BEFORE_PUNCT
        .replace_all(collapsed.trim(), "$1")
        .into_owned()
}

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Opposite-polarity phrase pairs, positive first.
const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("allowed", "not allowed"),
    ("allowed", "prohibited"),
    ("allowed", "forbidden"),
    ("required", "not required"),
    ("required", "optional"),
    ("must", "must not"),
    ("shall", "shall not"),
    ("enabled", "disabled"),
    ("always", "never"),
    ("mandatory", "voluntary"),
    ("permitted", "banned"),
    ("can", "cannot"),
    ("should", "should not"),
    ("approve", "reject"),
    ("include", "exclude"),
];

/// Terms that make a single signal worth more than `low`.
pub(crate) const STRONG_MODALS: &[&str] = &["must", "required"];

struct PolarityPair {
    positive: &'static str,
    negative: &'static str,
    positive_re: Regex,
    negative_re: Regex,
}

static POLARITY_PAIRS: LazyLock<Vec<PolarityPair>> = LazyLock::new(|| {
    ANTONYM_PAIRS
        .iter()
        .map(|&(positive, negative)| PolarityPair {
            positive,
            negative,
            positive_re: phrase_regex(positive),
            negative_re: phrase_regex(negative),
        })
        .collect()
});

static RE_NUMERIC_CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(minimum|maximum|at least|at most|no more than|no fewer than)\s+(\d+)").unwrap()
});

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn phrase_regex(phrase: &str) -> Regex {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    Regex::new(&format!(r"\b{}\b", words.join(r"\s+"))).unwrap()
}

fn normalise(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}

struct Polarity {
    positive: bool,
    negative: bool,
}

// The negative phrase is removed before looking for the positive one, so
// "must not" does not also count as "must".
fn polarity(pair: &PolarityPair, text: &str) -> Polarity {
    let negative = pair.negative_re.is_match(text);
    let positive = if negative {
        pair.positive_re.is_match(&pair.negative_re.replace_all(text, " "))
    } else {
        pair.positive_re.is_match(text)
    };

    Polarity { positive, negative }
}

/// Antonym conflicts between two paragraphs, in pair-list order.
pub fn negation_conflicts(text_a: &str, text_b: &str) -> Vec<String> {
    let a = normalise(text_a);
    let b = normalise(text_b);

    POLARITY_PAIRS
        .iter()
        .filter(|pair| {
            let pa = polarity(pair, &a);
            let pb = polarity(pair, &b);
            (pa.positive && pb.negative) || (pa.negative && pb.positive)
        })
        .map(|pair| format!("'{}' vs '{}'", pair.positive, pair.negative))
        .collect()
}

fn numeric_constraints(text: &str) -> Vec<(String, String)> {
    RE_NUMERIC_CONSTRAINT
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), canonical_number(&caps[2])))
        .collect()
}

fn canonical_number(digits: &str) -> String {
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn cmp_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Same qualifier, different bound: `minimum 8` against `minimum 12`.
///
/// Each conflict is reported with its numbers in ascending order and the
/// list is sorted, so argument order never changes the output.
pub fn numeric_conflicts(text_a: &str, text_b: &str) -> Vec<String> {
    let a = numeric_constraints(&normalise(text_a));
    let b = numeric_constraints(&normalise(text_b));

    let mut conflicts: Vec<String> = Vec::new();
    for (qualifier_a, number_a) in &a {
        for (qualifier_b, number_b) in &b {
            if qualifier_a != qualifier_b || number_a == number_b {
                continue;
            }
            let (lo, hi) = match cmp_numbers(number_a, number_b) {
                Ordering::Greater => (number_b, number_a),
                _ => (number_a, number_b),
            };
            conflicts.push(format!("'{qualifier_a} {lo}' vs '{qualifier_a} {hi}'"));
        }
    }

    conflicts.sort();
    conflicts.dedup();
    conflicts
}

/// Every heuristic signal for a pair: antonyms first, then numeric bounds.
pub fn heuristic_signals(text_a: &str, text_b: &str) -> Vec<String> {
    let mut signals = negation_conflicts(text_a, text_b);
    signals.extend(numeric_conflicts(text_a, text_b));
    signals
}

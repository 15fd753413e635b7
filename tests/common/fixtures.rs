//! Test fixtures for integration tests.

use std::path::{Path, PathBuf};

use citegate::retrieval::Bm25Index;

/// A small handbook corpus with one built-in conflict (hr::p2 vs hr::p3).
pub const HANDBOOK_JSONL: &str = r#"{"paragraph_id": "hr::p1", "doc_id": "hr", "page": 3, "text": "Passwords must be at least 12 characters long and rotated every 90 days."}
{"paragraph_id": "hr::p2", "doc_id": "hr", "page": 7, "text": "Remote work is allowed for full time staff with manager approval."}
{"paragraph_id": "hr::p3", "doc_id": "hr", "page": 8, "text": "Remote work is prohibited for contractors."}
{"id": "it::p1", "doc_id": "it", "page": 1, "text": "Laptops are encrypted with full disk encryption before issue."}
{"id": "it::p2", "doc_id": "it", "page": 2, "text": "Visitors sign in at reception and wear a badge."}
"#;

pub const PASSWORD_QUESTION: &str = "How long must passwords be?";
pub const PASSWORD_ANSWER: &str = "Passwords must be at least 12 characters long [CITATION: hr::p1].";

pub const CONTRACTOR_QUESTION: &str = "Can contractors do remote work?";
pub const CONTRACTOR_ANSWER: &str = "Remote work is prohibited for contractors [CITATION: hr::p3].";

/// No token overlaps the corpus, so every BM25 score is zero.
pub const UNANSWERABLE_QUESTION: &str = "Quarterly dividend schedule?";

pub fn write_corpus(dir: &Path) -> PathBuf {
    let path = dir.join("paragraphs.jsonl");
    std::fs::write(&path, HANDBOOK_JSONL).expect("corpus should be writable");
    path
}

pub fn handbook_index(dir: &Path) -> Bm25Index {
    Bm25Index::load(write_corpus(dir)).expect("corpus should load")
}

/// The JSON object a well-behaved generation model replies with.
pub fn generation_reply(answer: &str, citations: &[&str]) -> String {
    serde_json::json!({
        "answer": answer,
        "citations": citations,
        "notes": [],
    })
    .to_string()
}

pub fn support_reply(supported: bool, quote: &str) -> String {
    serde_json::json!({
        "supported": supported,
        "rationale": "quoted from the cited paragraph",
        "quote": quote,
    })
    .to_string()
}

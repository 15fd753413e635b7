use std::collections::HashSet;
use std::sync::Arc;

use super::prompts::{NAIVE_SYSTEM_PROMPT, PROMPT_ONLY_SYSTEM_PROMPT, SYSTEM_PROMPT, format_evidence_block};
use super::*;
use crate::claims::split_claims;
use crate::constants::{INSUFFICIENT_EVIDENCE, notes};
use crate::evidence::{Candidate, EvidenceItem};
use crate::judge::MockLlmClient;

fn item(id: &str, text: &str) -> EvidenceItem {
    EvidenceItem::from_retrieval(Candidate::new(id, "it-security.pdf", 3, text, 0.8))
}

fn evidence() -> Vec<EvidenceItem> {
    vec![
        item("sec::p4", "Passwords must be at least 12 characters long."),
        item("sec::p7", "Accounts lock after five failed login attempts."),
    ]
}

#[test]
fn test_evidence_block_format() {
    let block = format_evidence_block(&evidence());

    assert!(block.starts_with(
        "--- Evidence 1 ---\nparagraph_id: sec::p4\nsource: it-security.pdf (page 3)\ntext: Passwords"
    ));
    assert!(block.contains("--- Evidence 2 ---\nparagraph_id: sec::p7"));
}

#[test]
fn test_parse_answer_mixed_citation_shapes() {
    let parsed = parse_answer(
        r#"{"answer": "A [CITATION: p1].", "citations": ["p1", {"paragraph_id": "p2"}, 7, null], "notes": "partial"}"#,
    )
    .unwrap();

    assert_eq!(parsed.citations, ["p1", "p2"]);
    assert_eq!(parsed.notes, ["partial"]);
}

#[test]
fn test_parse_answer_requires_answer_field() {
    assert!(parse_answer(r#"{"citations": ["p1"]}"#).is_none());
    assert!(parse_answer("The answer is twelve characters.").is_none());
}

#[test]
fn test_validate_citations_flags_invalid_and_missing() {
    let valid: HashSet<&str> = ["p1"].into_iter().collect();

    let cleaned = validate_citations(
        GeneratedAnswer {
            answer: "Something.".to_string(),
            citations: vec!["p1".to_string(), "ghost".to_string()],
            notes: Vec::new(),
        },
        &valid,
    );
    assert_eq!(cleaned.citations, ["p1"]);
    assert_eq!(cleaned.notes, [notes::INVALID_CITATIONS_REMOVED]);

    let uncited = validate_citations(
        GeneratedAnswer {
            answer: "Something.".to_string(),
            ..GeneratedAnswer::default()
        },
        &valid,
    );
    assert_eq!(uncited.notes, [notes::NO_CITATIONS_GIVEN]);
}

#[test]
fn test_validate_citations_clears_refusal() {
    let valid: HashSet<&str> = ["p1"].into_iter().collect();

    let refusal = validate_citations(
        GeneratedAnswer {
            answer: INSUFFICIENT_EVIDENCE.to_string(),
            citations: vec!["p1".to_string()],
            notes: Vec::new(),
        },
        &valid,
    );

    assert!(refusal.citations.is_empty());
    assert!(refusal.notes.is_empty());
}

#[tokio::test]
async fn test_llm_generator_happy_path() {
    let client = Arc::new(MockLlmClient::new().with_response(
        r#"{"answer": "Passwords must be at least 12 characters [CITATION: sec::p4].", "citations": ["sec::p4"]}"#,
    ));
    let generator = LlmGenerator::new(client.clone());

    let answer = generator.generate("How long must passwords be?", &evidence()).await.unwrap();

    assert_eq!(answer.citations, ["sec::p4"]);
    assert!(answer.notes.is_empty());
    assert_eq!(client.call_count(), 1);

    let (system, user) = &client.calls()[0];
    assert_eq!(system, SYSTEM_PROMPT);
    assert!(user.contains("Question: How long must passwords be?"));
    assert!(user.contains("paragraph_id: sec::p7"));
}

#[tokio::test]
async fn test_llm_generator_repairs_once() {
    let client = Arc::new(
        MockLlmClient::new()
            .with_response("Passwords need 12 characters.")
            .with_response(r#"```json
{"answer": "Passwords need 12 characters [CITATION: sec::p4].", "citations": ["sec::p4"]}
```"#),
    );
    let generator = LlmGenerator::new(client.clone());

    let answer = generator.generate("q", &evidence()).await.unwrap();

    assert_eq!(answer.answer, "Passwords need 12 characters [CITATION: sec::p4].");
    assert_eq!(client.call_count(), 2);
    assert_eq!(client.calls()[1].1, "Passwords need 12 characters.");
}

#[tokio::test]
async fn test_llm_generator_raw_text_after_failed_repair() {
    let raw = "x".repeat(800);
    let client = Arc::new(
        MockLlmClient::new()
            .with_response(raw.clone())
            .with_response("still not json"),
    );
    let generator = LlmGenerator::new(client);

    let answer = generator.generate("q", &evidence()).await.unwrap();

    assert_eq!(answer.answer.chars().count(), 500);
    assert!(answer.citations.is_empty());
    assert_eq!(answer.notes[0], notes::JSON_PARSE_FAILED);
    assert!(answer.notes.contains(&notes::NO_CITATIONS_GIVEN.to_string()));
}

#[tokio::test]
async fn test_llm_generator_repair_transport_error_degrades() {
    let client = Arc::new(
        MockLlmClient::new()
            .with_response("not json")
            .with_error("connection reset"),
    );

    let answer = LlmGenerator::new(client).generate("q", &evidence()).await.unwrap();

    assert_eq!(answer.answer, "not json");
    assert_eq!(answer.notes[0], notes::JSON_PARSE_FAILED);
}

#[tokio::test]
async fn test_llm_generator_call_failure_is_error() {
    let client = Arc::new(MockLlmClient::new().with_error("401 unauthorized"));

    let result = LlmGenerator::new(client).generate("q", &evidence()).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("401 unauthorized"));
}

#[tokio::test]
async fn test_llm_generator_refusal_drops_citations() {
    let client = Arc::new(MockLlmClient::new().with_response(
        r#"{"answer": "INSUFFICIENT_EVIDENCE", "citations": ["sec::p4"], "notes": null}"#,
    ));

    let answer = LlmGenerator::new(client).generate("q", &evidence()).await.unwrap();

    assert_eq!(answer.answer, INSUFFICIENT_EVIDENCE);
    assert!(answer.citations.is_empty());
}

#[tokio::test]
async fn test_llm_generator_naive_uses_own_prompt() {
    let client = Arc::new(MockLlmClient::new().with_response(
        r#"{"answer": "Passwords need 12 characters [CITATION: sec::p4].", "citations": ["sec::p4", "hr::p9"]}"#,
    ));

    let answer = LlmGenerator::new(client.clone())
        .generate_naive("How long must passwords be?", &evidence())
        .await
        .unwrap();

    assert_eq!(answer.citations, ["sec::p4"]);
    assert!(answer.notes.contains(&notes::INVALID_CITATIONS_REMOVED.to_string()));

    let (system, user) = &client.calls()[0];
    assert_eq!(system, NAIVE_SYSTEM_PROMPT);
    assert!(user.starts_with("Evidence paragraphs:\n"));
    assert!(user.contains("paragraph_id: sec::p7"));
}

#[tokio::test]
async fn test_llm_generator_prompt_only_sends_no_evidence() {
    let client = Arc::new(MockLlmClient::new().with_response(
        r#"{"answer": "Most companies require 8 to 12 characters.", "citations": ["sec::p4"]}"#,
    ));

    let answer = LlmGenerator::new(client.clone())
        .generate_prompt_only("How long must passwords be?")
        .await
        .unwrap();

    assert_eq!(answer.answer, "Most companies require 8 to 12 characters.");
    assert!(answer.citations.is_empty());
    assert!(!answer.notes.contains(&notes::NO_CITATIONS_GIVEN.to_string()));

    let (system, user) = &client.calls()[0];
    assert_eq!(system, PROMPT_ONLY_SYSTEM_PROMPT);
    assert_eq!(user, "Question: How long must passwords be?\n\nRespond with valid JSON only.");
}

#[tokio::test]
async fn test_llm_generator_prompt_only_repairs_once() {
    let client = Arc::new(
        MockLlmClient::new()
            .with_response("Twelve characters.")
            .with_response(r#"{"answer": "Twelve characters.", "citations": []}"#),
    );

    let answer = LlmGenerator::new(client.clone())
        .generate_prompt_only("q")
        .await
        .unwrap();

    assert_eq!(answer.answer, "Twelve characters.");
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_extractive_cannot_answer_prompt_only() {
    let result = ExtractiveGenerator::new().generate_prompt_only("q").await;

    assert!(matches!(result, Err(GenerationError::PromptOnlyUnsupported)));
}

#[tokio::test]
async fn test_extractive_naive_matches_gated() {
    let evidence = vec![item("hr::p2", "Visitors must sign in at reception.")];
    let question = "Do visitors sign in at reception?";

    let gated = ExtractiveGenerator::new().generate(question, &evidence).await.unwrap();
    let naive = ExtractiveGenerator::new().generate_naive(question, &evidence).await.unwrap();

    assert_eq!(gated, naive);
}

#[tokio::test]
async fn test_extractive_cites_every_sentence() {
    let evidence = vec![item(
        "hr::p2",
        "Visitors must sign in at reception. Escorts are required at all times! Badges are returned on exit",
    )];

    let answer = ExtractiveGenerator::new()
        .generate("Do visitors need to sign in at reception?", &evidence)
        .await
        .unwrap();

    assert_eq!(
        answer.answer,
        "Visitors must sign in at reception [CITATION: hr::p2]. \
         Escorts are required at all times [CITATION: hr::p2]! \
         Badges are returned on exit [CITATION: hr::p2]."
    );
    assert_eq!(answer.citations, ["hr::p2"]);
    assert_eq!(answer.notes, [notes::EXTRACTIVE_FALLBACK]);

    let claims = split_claims(&answer.answer);
    assert_eq!(claims.len(), 3);
    assert!(claims.iter().all(|c| c.citations == ["hr::p2"]));
}

#[tokio::test]
async fn test_extractive_relevance_gate_refuses() {
    let evidence = vec![item("fin::p1", "Expense reports are filed monthly via the finance portal.")];

    let answer = ExtractiveGenerator::new()
        .generate("What is the password rotation period for administrators?", &evidence)
        .await
        .unwrap();

    assert_eq!(answer.answer, INSUFFICIENT_EVIDENCE);
    assert!(answer.citations.is_empty());
    assert_eq!(answer.notes, [notes::FALLBACK_RELEVANCE_FAIL]);
}

#[test]
fn test_relevance_gate_thresholds() {
    // two shared keywords
    assert!(is_relevant_to_question(
        "password rotation policy for contractors and interns",
        "The password rotation schedule is quarterly."
    ));
    // one of four keywords is exactly 25%
    assert!(is_relevant_to_question("laptop encryption vendor approval", "Encryption is standard."));
    // stopword-only question
    assert!(is_relevant_to_question("what is it?", "anything"));
    assert!(!is_relevant_to_question(
        "laptop encryption vendor approval process",
        "Encryption is standard."
    ));
}

#[tokio::test]
async fn test_extractive_empty_evidence_refuses() {
    let answer = ExtractiveGenerator::new().generate("q", &[]).await.unwrap();

    assert_eq!(answer, GeneratedAnswer::refusal());
}

#[tokio::test]
async fn test_mock_generator() {
    let failing = MockGenerator::failing("boom");
    assert!(failing.generate("q", &[]).await.is_err());
    assert_eq!(failing.call_count(), 1);

    let answering = MockGenerator::answering("A [CITATION: p1].", &["p1"]);
    assert_eq!(answering.generate("q", &[]).await.unwrap().citations, ["p1"]);
    assert!(answering.generate_prompt_only("q").await.unwrap().citations.is_empty());
    assert_eq!(answering.modes(), ["gated", "prompt_only"]);
}

use std::sync::Arc;

use serial_test::serial;
use tempfile::TempDir;

use super::*;
use crate::config::ConfigError;
use crate::constants::{ERROR_ANSWER, INSUFFICIENT_EVIDENCE, notes};
use crate::contradiction::{ContradictionConfidence, ContradictionPolicy};
use crate::evidence::{Candidate, EvidenceReranker, MockScorer};
use crate::generate::MockGenerator;
use crate::judge::{LlmJudge, MockLlmClient};
use crate::retrieval::MockSearchBackend;
use crate::verify::Tier;

fn candidate(id: &str, text: &str, score: f32) -> Candidate {
    Candidate::new(id, "handbook", 1, text, score)
}

fn password_corpus() -> Vec<Candidate> {
    vec![
        candidate("p1", "Passwords must be at least 12 characters long.", 0.9),
        candidate("p2", "Expense reports are filed monthly by finance.", 0.6),
    ]
}

fn pipeline(candidates: Vec<Candidate>, generator: Arc<MockGenerator>, config: PipelineConfig) -> Pipeline {
    Pipeline::new(Arc::new(MockSearchBackend::new(candidates)), generator, config)
}

fn has_note(result: &PipelineResult, note: &str) -> bool {
    result.notes.iter().any(|n| n == note)
}

#[tokio::test]
async fn test_low_confidence_abstains_before_generation() {
    let generator = Arc::new(MockGenerator::answering("anything [CITATION: p1].", &["p1"]));
    let candidates = vec![candidate("p1", "Unrelated text.", 0.12), candidate("p2", "More.", 0.05)];
    let pipeline = pipeline(candidates, generator.clone(), PipelineConfig::default());

    let result = pipeline.run("what is the parental leave policy?").await.unwrap();

    assert_eq!(result.answer, INSUFFICIENT_EVIDENCE);
    assert!(result.citations.is_empty());
    assert!(result.claim_verification.is_none());
    assert_eq!(result.evidence.len(), 2);
    assert_eq!(result.confidence.max_rerank, 0.12);
    assert!(has_note(&result, notes::ABSTAINED_LOW_CONFIDENCE));
    assert!(has_note(&result, notes::RERANK_FALLBACK));
    assert_eq!(generator.call_count(), 0);
    assert!(result.timings.llm_gen_ms.is_none());
}

#[tokio::test]
async fn test_score_equal_to_threshold_does_not_abstain() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords must be at least 12 characters [CITATION: p1].",
        &["p1"],
    ));
    let candidates = vec![candidate("p1", "Passwords must be at least 12 characters long.", 0.30)];
    let pipeline = pipeline(candidates, generator.clone(), PipelineConfig::default());

    let result = pipeline.run("minimum password length?").await.unwrap();

    assert_ne!(result.answer, INSUFFICIENT_EVIDENCE);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn test_supported_answer_passes_through() {
    let answer = "Passwords must be at least 12 characters [CITATION: p1].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p1"]));
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("how long must passwords be?").await.unwrap();

    assert_eq!(result.answer, answer);
    assert_eq!(result.citations, vec!["p1"]);
    let summary = result.claim_verification.as_ref().unwrap();
    assert_eq!(summary.claims.len(), 1);
    assert_eq!(summary.support_rate, 1.0);
    assert_eq!(summary.claims[0].verification_tier, Tier::Heuristic);
    assert!(result.contradictions.is_empty());
    assert!(!result.is_abstained());
    assert!(result.timings.verify_ms.is_some());
    assert!(result.timings.contradictions_ms.is_some());
}

#[tokio::test]
async fn test_inline_citations_merged_and_filtered() {
    let answer = "Passwords must be at least 12 characters [CITATION: p1] [CITATION: p9].";
    let generator = Arc::new(MockGenerator::answering(answer, &[]));
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("password length").await.unwrap();

    assert_eq!(result.citations, vec!["p1"]);
}

#[tokio::test]
async fn test_partial_support_repairs_answer() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords must be at least 12 characters [CITATION: p1]. \
         Badges are collected by security on exit [CITATION: p2].",
        &["p1", "p2"],
    ));
    let config = PipelineConfig {
        min_support_rate: 0.5,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(password_corpus(), generator, config);

    let result = pipeline.run("password and badge rules").await.unwrap();

    assert_eq!(result.answer, "Passwords must be at least 12 characters.");
    assert_eq!(result.citations, vec!["p1"]);
    assert!(has_note(&result, notes::UNSUPPORTED_CLAIMS_REMOVED));
    let summary = result.claim_verification.unwrap();
    assert_eq!(summary.supported_claims, 1);
    assert_eq!(summary.unsupported_claims, 1);
}

#[tokio::test]
async fn test_low_support_rate_refuses() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords must be at least 12 characters [CITATION: p1]. \
         Badges are collected by security on exit [CITATION: p2].",
        &["p1", "p2"],
    ));
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("password and badge rules").await.unwrap();

    assert_eq!(result.answer, INSUFFICIENT_EVIDENCE);
    assert!(result.citations.is_empty());
    assert!(has_note(&result, notes::ABSTAINED_LOW_SUPPORT_RATE));
    assert_eq!(result.claim_verification.unwrap().support_rate, 0.5);
    // A refused answer skips contradiction detection.
    assert!(result.timings.contradictions_ms.is_none());
}

#[tokio::test]
async fn test_generation_failure_yields_error_record() {
    let generator = Arc::new(MockGenerator::failing("upstream timed out"));
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("password length").await.unwrap();

    assert_eq!(result.answer, ERROR_ANSWER);
    assert!(result.is_error());
    assert!(result.citations.is_empty());
    assert_eq!(result.evidence.len(), 2);
    assert!(result.confidence.max_rerank > 0.0);
    let error_note = result.notes.last().unwrap();
    assert!(error_note.starts_with("ERROR: "));
    assert!(error_note.contains("upstream timed out"));
}

#[tokio::test]
async fn test_generator_refusal_skips_downstream_stages() {
    let generator = Arc::new(MockGenerator::refusing());
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("password length").await.unwrap();

    assert!(result.is_abstained());
    assert!(result.citations.is_empty());
    assert!(result.claim_verification.is_none());
    assert!(result.contradictions.is_empty());
}

#[tokio::test]
async fn test_retrieval_failure_propagates() {
    let pipeline = Pipeline::new(
        Arc::new(MockSearchBackend::failing("index offline")),
        Arc::new(MockGenerator::refusing()),
        PipelineConfig::default(),
    );

    let err = pipeline.run("anything").await.unwrap_err();

    assert!(matches!(err, PipelineError::Retrieval(_)));
}

#[tokio::test]
async fn test_rerank_disabled_keeps_retrieval_order() {
    let candidates = vec![
        candidate("p1", "Expense reports are filed monthly.", 0.4),
        candidate("p2", "Passwords must be at least 12 characters long.", 0.9),
        candidate("p3", "The cafeteria opens early.", 0.8),
    ];
    let config = PipelineConfig {
        rerank_k: 2,
        stages: StageToggles {
            rerank: false,
            ..StageToggles::default()
        },
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(candidates, Arc::new(MockGenerator::refusing()), config);

    let result = pipeline.run("passwords").await.unwrap();

    let ids: Vec<&str> = result.evidence.iter().map(|e| e.paragraph_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert!(has_note(&result, notes::RERANK_DISABLED));
    assert!(!has_note(&result, notes::RERANK_FALLBACK));
    assert!(result.timings.rerank_ms.is_none());
}

#[tokio::test]
async fn test_scorer_reorders_evidence_without_fallback_note() {
    let generator = Arc::new(MockGenerator::refusing());
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default())
        .with_reranker(EvidenceReranker::new(Arc::new(MockScorer::with_logits(vec![-1.0, 3.0]))));

    let result = pipeline.run("expenses").await.unwrap();

    assert_eq!(result.evidence[0].paragraph_id, "p2");
    assert!(result.evidence[0].score_rerank > 0.9);
    assert!(!has_note(&result, notes::RERANK_FALLBACK));
}

#[tokio::test]
async fn test_failing_scorer_falls_back() {
    let generator = Arc::new(MockGenerator::refusing());
    let pipeline = pipeline(password_corpus(), generator, PipelineConfig::default())
        .with_reranker(EvidenceReranker::new(Arc::new(MockScorer::failing())));

    let result = pipeline.run("expenses").await.unwrap();

    assert_eq!(result.evidence[0].paragraph_id, "p1");
    assert_eq!(result.evidence[0].score_rerank, 0.9);
    assert!(has_note(&result, notes::RERANK_FALLBACK));
}

#[tokio::test]
async fn test_verify_disabled() {
    let answer = "Badges are collected by security on exit [CITATION: p2].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p2"]));
    let config = PipelineConfig {
        stages: StageToggles {
            verify: false,
            ..StageToggles::default()
        },
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(password_corpus(), generator, config);

    let result = pipeline.run("badges").await.unwrap();

    assert_eq!(result.answer, answer);
    assert_eq!(result.citations, vec!["p2"]);
    assert!(result.claim_verification.is_none());
    assert!(has_note(&result, notes::VERIFY_DISABLED));
}

fn remote_work_corpus() -> Vec<Candidate> {
    vec![
        candidate("p1", "Remote work is allowed for full time staff.", 0.9),
        candidate("p2", "Remote work is prohibited for contractors.", 0.8),
    ]
}

#[tokio::test]
async fn test_contradiction_surfaced() {
    let answer = "Remote work is allowed for full time staff [CITATION: p1].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p1"]));
    let pipeline = pipeline(remote_work_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("can I work remotely?").await.unwrap();

    assert_eq!(result.contradictions.len(), 1);
    assert_eq!(result.contradictions[0].confidence, ContradictionConfidence::Low);
    assert_eq!(result.citations, vec!["p1", "p2"]);
    assert_eq!(
        result.answer,
        format!("{answer} Note: some evidence sources may conflict on this point ('allowed' vs 'prohibited').")
    );
    assert!(has_note(&result, notes::CONTRADICTION_SURFACED));
}

#[tokio::test]
async fn test_abstain_on_high_without_high_record_surfaces() {
    let answer = "Remote work is allowed for full time staff [CITATION: p1].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p1"]));
    let config = PipelineConfig {
        contradiction_policy: ContradictionPolicy::AbstainOnHigh,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(remote_work_corpus(), generator, config);

    let result = pipeline.run("can I work remotely?").await.unwrap();

    assert!(!result.is_abstained());
    assert!(has_note(&result, notes::CONTRADICTION_SURFACED));
}

fn rotation_corpus() -> Vec<Candidate> {
    vec![
        candidate("p1", "Passwords need at least 12 characters and rotation is mandatory.", 0.9),
        candidate("p2", "Passwords need at least 8 characters and rotation is voluntary.", 0.7),
    ]
}

#[tokio::test]
async fn test_high_contradiction_refuses_under_abstain_on_high() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords need at least 12 characters [CITATION: p1].",
        &["p1"],
    ));
    let config = PipelineConfig {
        contradiction_policy: ContradictionPolicy::AbstainOnHigh,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(rotation_corpus(), generator, config);

    let result = pipeline.run("password rules").await.unwrap();

    assert_eq!(result.answer, INSUFFICIENT_EVIDENCE);
    assert!(result.citations.is_empty());
    assert_eq!(result.contradictions.len(), 1);
    assert_eq!(result.contradictions[0].confidence, ContradictionConfidence::High);
    assert!(has_note(&result, notes::ABSTAINED_CONTRADICTION_HIGH));
}

#[tokio::test]
async fn test_high_contradiction_surfaced_by_default() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords need at least 12 characters [CITATION: p1].",
        &["p1"],
    ));
    let pipeline = pipeline(rotation_corpus(), generator, PipelineConfig::default());

    let result = pipeline.run("password rules").await.unwrap();

    assert_eq!(result.citations, vec!["p1", "p2"]);
    assert!(has_note(&result, notes::CONTRADICTION_SURFACED));
}

#[tokio::test]
async fn test_contradictions_disabled() {
    let answer = "Remote work is allowed for full time staff [CITATION: p1].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p1"]));
    let config = PipelineConfig {
        stages: StageToggles {
            contradictions: false,
            ..StageToggles::default()
        },
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(remote_work_corpus(), generator, config);

    let result = pipeline.run("can I work remotely?").await.unwrap();

    assert_eq!(result.answer, answer);
    assert!(result.contradictions.is_empty());
    assert!(has_note(&result, notes::CONTRADICTIONS_DISABLED));
}

#[tokio::test]
async fn test_support_judge_attached_only_when_enabled() {
    let answer = "Passwords must be at least 12 characters [CITATION: p1].";
    let verdict = r#"{"supported": true, "rationale": "stated directly", "quote": "at least 12 characters"}"#;

    for llm_verify in [false, true] {
        let client = Arc::new(MockLlmClient::replying(verdict));
        let judge = Arc::new(LlmJudge::new(client.clone()));
        let config = PipelineConfig {
            llm_verify,
            ..PipelineConfig::default()
        };
        let pipeline = pipeline(
            password_corpus(),
            Arc::new(MockGenerator::answering(answer, &["p1"])),
            config,
        )
        .with_support_judge(judge.clone())
        .with_contradiction_judge(judge);

        let result = pipeline.run("password length").await.unwrap();
        let claim = &result.claim_verification.unwrap().claims[0];

        if llm_verify {
            assert_eq!(claim.verification_tier, Tier::Judge);
            assert_eq!(claim.support_rationale, "LLM: stated directly");
            assert_eq!(client.call_count(), 1);
        } else {
            assert_eq!(claim.verification_tier, Tier::Heuristic);
            assert_eq!(client.call_count(), 0);
        }
    }
}

#[tokio::test]
async fn test_run_batch_keeps_going_after_errors() {
    let ok = Pipeline::new(
        Arc::new(MockSearchBackend::new(password_corpus())),
        Arc::new(MockGenerator::answering(
            "Passwords must be at least 12 characters [CITATION: p1].",
            &["p1"],
        )),
        PipelineConfig::default(),
    );
    let queries: Vec<QueryRecord> = (0..5)
        .map(|i| QueryRecord {
            query_id: format!("q{i}"),
            question: "password length".to_string(),
            category: Some("answerable".to_string()),
            gold_paragraph_ids: Vec::new(),
        })
        .collect();

    let records = run_batch(&ok, queries.clone(), 3).await;
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| !r.is_abstained && !r.result.is_error()));

    let broken = Pipeline::new(
        Arc::new(MockSearchBackend::failing("index offline")),
        Arc::new(MockGenerator::refusing()),
        PipelineConfig::default(),
    );
    let records = run_batch(&broken, queries, 2).await;
    let summary = BatchSummary::from_records(&records);

    assert_eq!(summary.total, 5);
    assert_eq!(summary.errored, 5);
    assert!(records[0].result.notes[0].contains("index offline"));
}

#[test]
fn test_batch_summary_counts() {
    let query = |id: &str| QueryRecord {
        query_id: id.to_string(),
        question: "q".to_string(),
        category: None,
        gold_paragraph_ids: Vec::new(),
    };
    let answered = PipelineResult {
        answer: "Yes [CITATION: p1].".to_string(),
        ..PipelineResult::failed("placeholder")
    };
    let abstained = PipelineResult::abstained(Default::default(), Vec::new(), Vec::new(), StageTimings::default());
    let records = vec![
        BatchRecord::new(query("a"), answered),
        BatchRecord::new(query("b"), abstained),
        BatchRecord::new(query("c"), PipelineResult::failed("boom")),
    ];

    let summary = BatchSummary::from_records(&records);

    assert_eq!(
        summary,
        BatchSummary {
            total: 3,
            answered: 1,
            abstained: 1,
            errored: 1
        }
    );
}

#[test]
fn test_batch_record_flattens_result() {
    let record = BatchRecord::new(
        QueryRecord {
            query_id: "q1".to_string(),
            question: "What?".to_string(),
            category: Some("unanswerable".to_string()),
            gold_paragraph_ids: Vec::new(),
        },
        PipelineResult::abstained(Default::default(), Vec::new(), vec!["ABSTAINED_LOW_CONFIDENCE".to_string()], StageTimings::default()),
    );

    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["query_id"], "q1");
    assert_eq!(json["is_abstained"], true);
    assert_eq!(json["answer"], INSUFFICIENT_EVIDENCE);
    assert_eq!(json["citations"], serde_json::json!([]));
    assert!(json["claim_verification"].is_null());
    assert!(json["timings"].get("retrieval_ms").is_none());
    assert!(json.get("retrieved_paragraph_ids").is_none());
    assert!(json["timings"].get("llm_gen_ms").is_none());
}

#[test]
fn test_load_and_write_jsonl() {
    let dir = TempDir::new().unwrap();
    let queries_path = dir.path().join("queries.jsonl");
    std::fs::write(
        &queries_path,
        "{\"query_id\": \"q1\", \"question\": \"How long are passwords?\", \"category\": \"answerable\"}\n\n\
         {\"query_id\": \"q2\", \"question\": \"Who approves travel?\"}\n",
    )
    .unwrap();

    let queries = load_queries(&queries_path).unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].category, None);

    let out = dir.path().join("nested").join("out.jsonl");
    write_records(&out, &queries).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert_eq!(load_queries(&out).unwrap(), queries);
}

#[test]
fn test_load_queries_reports_bad_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queries.jsonl");
    std::fs::write(&path, "{\"query_id\": \"q1\", \"question\": \"ok\"}\n{\"query_id\": 7}\n").unwrap();

    let err = load_queries(&path).unwrap_err();

    assert!(matches!(err, PipelineError::InvalidQuery { line: 2, .. }));
}

#[test]
fn test_pipeline_config_defaults_validate() {
    let config = PipelineConfig::default();

    assert_eq!(config.retrieve_k, 20);
    assert_eq!(config.rerank_k, 5);
    assert_eq!(config.abstain_threshold, 0.30);
    assert_eq!(config.min_support_rate, 0.80);
    assert_eq!(config.overlap_threshold, 0.10);
    assert_eq!(config.contradiction_policy, ContradictionPolicy::Surface);
    assert_eq!(config.stages, StageToggles::default());
    assert_eq!(config.baseline, Baseline::Gated);
    assert!(!config.uses_llm_judges());
    assert!(config.validate().is_ok());
}

#[test]
fn test_pipeline_config_validation_errors() {
    let out_of_range = PipelineConfig {
        abstain_threshold: 1.2,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        out_of_range.validate(),
        Err(ConfigError::ThresholdOutOfRange { .. })
    ));

    let zero_k = PipelineConfig {
        retrieve_k: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(zero_k.validate(), Err(ConfigError::ZeroCount { .. })));

    let inverted = PipelineConfig {
        retrieve_k: 3,
        rerank_k: 5,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        inverted.validate(),
        Err(ConfigError::RerankExceedsRetrieve { .. })
    ));
}

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { std::env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { std::env::remove_var(key) };
    }

    result
}

#[test]
#[serial]
fn test_pipeline_config_from_env() {
    with_env_vars(
        &[
            ("CITEGATE_RETRIEVE_K", "30"),
            ("CITEGATE_ABSTAIN_THRESHOLD", "0.45"),
            ("CITEGATE_CONTRADICTION_POLICY", "Abstain_On_High"),
            ("CITEGATE_LLM_VERIFY", "1"),
            ("CITEGATE_NO_RERANK", "true"),
        ],
        || {
            let config = PipelineConfig::from_env().expect("should parse");

            assert_eq!(config.retrieve_k, 30);
            assert_eq!(config.abstain_threshold, 0.45);
            assert_eq!(config.contradiction_policy, ContradictionPolicy::AbstainOnHigh);
            assert!(config.llm_verify);
            assert!(!config.llm_contradictions);
            assert!(!config.stages.rerank);
            assert!(config.stages.verify);
        },
    );
}

#[test]
#[serial]
fn test_pipeline_config_rejects_unknown_policy() {
    with_env_vars(&[("CITEGATE_CONTRADICTION_POLICY", "ignore")], || {
        let err = PipelineConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("abstain_on_high"));
    });
}

#[test]
#[serial]
fn test_pipeline_config_reads_baseline() {
    for (value, expected) in [
        ("b1", Baseline::PromptOnly),
        ("prompt_only", Baseline::PromptOnly),
        ("B2", Baseline::NaiveRag),
        ("naive_rag", Baseline::NaiveRag),
        ("gated", Baseline::Gated),
    ] {
        with_env_vars(&[("CITEGATE_BASELINE", value)], || {
            assert_eq!(PipelineConfig::from_env().unwrap().baseline, expected);
        });
    }

    with_env_vars(&[("CITEGATE_BASELINE", "b4")], || {
        let err = PipelineConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("naive_rag"));
    });
}

#[test]
fn test_llm_judges_needed_only_when_enabled() {
    let verify = PipelineConfig {
        llm_verify: true,
        ..PipelineConfig::default()
    };
    let contradictions = PipelineConfig {
        llm_contradictions: true,
        ..PipelineConfig::default()
    };
    let baseline = PipelineConfig {
        baseline: Baseline::NaiveRag,
        llm_verify: true,
        ..PipelineConfig::default()
    };

    assert!(verify.uses_llm_judges());
    assert!(contradictions.uses_llm_judges());
    assert!(!baseline.uses_llm_judges());
    assert!(!PipelineConfig::default().uses_llm_judges());
}

#[tokio::test]
async fn test_prompt_only_skips_retrieval_and_citations() {
    let search = Arc::new(MockSearchBackend::new(password_corpus()));
    let generator = Arc::new(MockGenerator::answering("Usually 8 characters [CITATION: p1].", &["p1"]));
    let config = PipelineConfig {
        baseline: Baseline::PromptOnly,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(search.clone(), generator.clone(), config);

    let result = pipeline.run("how long must passwords be?").await.unwrap();

    assert_eq!(result.answer, "Usually 8 characters [CITATION: p1].");
    assert!(result.citations.is_empty());
    assert!(result.evidence.is_empty());
    assert!(result.retrieved_paragraph_ids.is_empty());
    assert!(result.claim_verification.is_none());
    assert_eq!(search.call_count(), 0);
    assert_eq!(generator.modes(), ["prompt_only"]);
    assert!(result.timings.retrieval_ms.is_none());
    assert!(result.timings.llm_gen_ms.is_some());
}

#[tokio::test]
async fn test_prompt_only_generation_failure_is_error_record() {
    let generator = Arc::new(MockGenerator::failing("quota exceeded"));
    let config = PipelineConfig {
        baseline: Baseline::PromptOnly,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(password_corpus(), generator, config);

    let result = pipeline.run("q").await.unwrap();

    assert!(result.is_error());
    assert!(result.notes[0].contains("quota exceeded"));
}

#[tokio::test]
async fn test_naive_rag_skips_every_gate() {
    // Scores this low would trip the confidence gate, and the answer is unsupported.
    let candidates = vec![
        candidate("p1", "Passwords must be at least 12 characters long.", 0.05),
        candidate("p2", "Passwords must not be shorter than 8 characters.", 0.04),
        candidate("p3", "Guest Wi-Fi is in the lobby.", 0.03),
    ];
    let answer = "Badges are collected on exit [CITATION: p2].";
    let generator = Arc::new(MockGenerator::answering(answer, &["p2"]));
    let config = PipelineConfig {
        baseline: Baseline::NaiveRag,
        rerank_k: 2,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(candidates, generator.clone(), config);

    let result = pipeline.run("password length").await.unwrap();

    assert_eq!(result.answer, answer);
    assert_eq!(result.citations, vec!["p2"]);
    assert_eq!(result.retrieved_paragraph_ids, vec!["p1", "p2"]);
    assert!(result.evidence.is_empty());
    assert!(result.claim_verification.is_none());
    assert!(result.contradictions.is_empty());
    assert!(result.notes.is_empty());
    assert_eq!(generator.modes(), ["naive"]);
    assert!(result.timings.retrieval_ms.is_some());
    assert!(result.timings.rerank_ms.is_none());
    assert!(result.timings.verify_ms.is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["retrieved_paragraph_ids"], serde_json::json!(["p1", "p2"]));
}

#[tokio::test]
async fn test_naive_rag_refusal_drops_citations() {
    let generator = Arc::new(MockGenerator::answering(INSUFFICIENT_EVIDENCE, &["p1"]));
    let config = PipelineConfig {
        baseline: Baseline::NaiveRag,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(password_corpus(), generator, config);

    let result = pipeline.run("q").await.unwrap();

    assert!(result.is_abstained());
    assert!(result.citations.is_empty());
    assert_eq!(result.retrieved_paragraph_ids.len(), 2);
}

#[tokio::test]
async fn test_naive_rag_retrieval_failure_propagates() {
    let config = PipelineConfig {
        baseline: Baseline::NaiveRag,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(
        Arc::new(MockSearchBackend::failing("index offline")),
        Arc::new(MockGenerator::refusing()),
        config,
    );

    assert!(matches!(pipeline.run("q").await, Err(PipelineError::Retrieval(_))));
}

#[tokio::test]
async fn test_gated_mode_uses_gated_generation() {
    let generator = Arc::new(MockGenerator::answering(
        "Passwords must be at least 12 characters [CITATION: p1].",
        &["p1"],
    ));
    let pipeline = pipeline(password_corpus(), generator.clone(), PipelineConfig::default());

    let result = pipeline.run("password length").await.unwrap();

    assert!(result.retrieved_paragraph_ids.is_empty());
    assert!(result.timings.retrieval_ms.is_some());
    assert_eq!(generator.modes(), ["gated"]);
}

#[test]
fn test_gold_ids_accept_list_or_joined_string() {
    let listed: QueryRecord =
        serde_json::from_str(r#"{"query_id": "q1", "question": "?", "gold_paragraph_ids": ["hr::p1", " hr::p2 "]}"#)
            .unwrap();
    let joined: QueryRecord =
        serde_json::from_str(r#"{"query_id": "q1", "question": "?", "gold_paragraph_ids": "hr::p1, hr::p2"}"#).unwrap();
    let missing: QueryRecord = serde_json::from_str(r#"{"query_id": "q1", "question": "?", "gold_paragraph_ids": "nan"}"#).unwrap();

    assert_eq!(listed.gold_paragraph_ids, ["hr::p1", "hr::p2"]);
    assert_eq!(joined.gold_paragraph_ids, ["hr::p1", "hr::p2"]);
    assert!(missing.gold_paragraph_ids.is_empty());
}

#[test]
fn test_resume_skips_recorded_queries() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("runs").join("predictions.jsonl");
    let query = |id: &str| QueryRecord {
        query_id: id.to_string(),
        question: "q".to_string(),
        category: Some("answerable".to_string()),
        gold_paragraph_ids: vec!["p1".to_string()],
    };

    assert!(load_records(&out).unwrap().is_empty());

    let first = vec![BatchRecord::new(query("q1"), PipelineResult::failed("boom"))];
    write_records(&out, &first).unwrap();
    // a line cut short by a crash
    let mut file = std::fs::OpenOptions::new().append(true).open(&out).unwrap();
    std::io::Write::write_all(&mut file, b"{\"query_id\": \"q2\", \"answ\n").unwrap();
    drop(file);

    let done = load_records(&out).unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].query_id, "q1");
    assert_eq!(done[0].gold_paragraph_ids, ["p1"]);
    assert!(done[0].result.is_error());

    let pending = pending_queries(vec![query("q1"), query("q2"), query("q3")], &done);
    let ids: Vec<&str> = pending.iter().map(|q| q.query_id.as_str()).collect();
    assert_eq!(ids, ["q2", "q3"]);

    let second = vec![BatchRecord::new(query("q2"), PipelineResult::failed("again"))];
    append_records(&out, &second).unwrap();
    let all = load_records(&out).unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.query_id.as_str()).collect();
    assert_eq!(ids, ["q1", "q2"]);
}

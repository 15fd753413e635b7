//! Citegate library crate (used by the batch binary and integration tests).
//!
//! Evidence-gated question answering: retrieved paragraphs are reranked, a
//! confidence gate refuses before any generation cost when the evidence is
//! weak, generated answers are split into cited claims and verified against
//! the paragraphs they cite, and conflicts between paragraphs are surfaced or
//! turned into a refusal.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`Pipeline`], [`PipelineConfig`], [`PipelineResult`] - per-query orchestration
//! - [`Baseline`] - gated pipeline, naive RAG or prompt-only
//! - [`run_batch`], [`QueryRecord`], [`BatchRecord`] - bounded-parallel batch runs
//! - [`EvalSummary`] - abstention, citation and retrieval figures over a run
//!
//! ## Stages
//! - [`EvidenceReranker`] - cross-encoder scoring with retrieval-score fallback
//! - [`compute_confidence`], [`should_abstain`] - confidence gate
//! - [`split_claims`] - claim splitting
//! - [`ClaimVerifier`], [`enforce_support_policy`] - claim support
//! - [`ContradictionDetector`], [`apply_contradiction_policy`] - evidence conflicts
//!
//! ## Collaborators
//! - [`SearchBackend`] / [`Bm25Index`] - candidate retrieval
//! - [`Generator`] / [`LlmGenerator`] / [`ExtractiveGenerator`] - answer generation
//! - [`LlmJudge`] / [`JudgeCache`] - tier-2 judges and their cache
//! - [`Reranker`] - Candle cross-encoder
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod claims;
pub mod config;
pub mod constants;
pub mod contradiction;
pub mod embedding;
pub mod evidence;
pub mod gate;
pub mod generate;
pub mod hashing;
pub mod judge;
pub mod metrics;
pub mod pipeline;
pub mod retrieval;
pub mod verify;

pub use claims::{Claim, extract_all_citations, split_claims};
pub use config::{Config, ConfigError};
pub use constants::{ERROR_ANSWER, INSUFFICIENT_EVIDENCE, is_refusal};
pub use contradiction::{
    ContradictionConfidence, ContradictionDetector, ContradictionJudge, ContradictionPolicy,
    ContradictionRecord, apply_contradiction_policy,
};
pub use embedding::{EmbeddingError, Reranker, RerankerConfig, RerankerError};
pub use evidence::{Candidate, EvidenceItem, EvidenceReranker, RelevanceScorer};
#[cfg(any(test, feature = "mock"))]
pub use evidence::MockScorer;
pub use gate::{CalibrationPoint, Confidence, calibrate_threshold, compute_confidence, should_abstain};
pub use generate::{ExtractiveGenerator, GeneratedAnswer, GenerationError, Generator, LlmGenerator};
#[cfg(any(test, feature = "mock"))]
pub use generate::MockGenerator;
pub use hashing::{claim_judge_key, contradiction_judge_key};
pub use judge::{GenaiClient, JudgeCache, JudgeError, LlmClient, LlmError, LlmJudge};
#[cfg(any(test, feature = "mock"))]
pub use judge::MockLlmClient;
pub use metrics::EvalSummary;
pub use pipeline::{
    Baseline, BatchRecord, BatchSummary, Pipeline, PipelineConfig, PipelineError, PipelineResult,
    QueryRecord, StageTimings, StageToggles, run_batch,
};
pub use retrieval::{Bm25Index, SearchBackend, SearchError};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockSearchBackend;
pub use verify::{
    ClaimVerdict, ClaimVerifier, SupportJudge, Tier, VerificationSummary, enforce_support_policy,
};

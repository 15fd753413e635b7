use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument};

use super::config::{Baseline, PipelineConfig};
use super::error::PipelineError;
use super::types::{PipelineResult, StageTimings, elapsed_ms, error_note};
use crate::claims::{extract_all_citations, split_claims};
use crate::constants::{ERROR_ANSWER, is_refusal, notes};
use crate::contradiction::{ContradictionDetector, ContradictionJudge, apply_contradiction_policy};
use crate::evidence::{EvidenceItem, EvidenceReranker, passthrough};
use crate::gate::{compute_confidence, should_abstain};
use crate::generate::Generator;
use crate::retrieval::SearchBackend;
use crate::verify::{ClaimVerifier, SupportJudge, enforce_support_policy, evidence_lookup};

/// Runs one question through retrieve, rerank, gate, generate, verify and
/// contradiction stages, producing a terminal [`PipelineResult`].
///
/// The configured [`Baseline`] can swap the whole flow for an ungated one:
/// naive RAG (retrieve then generate) or prompt-only (generate from the
/// question alone).
///
/// Holds no per-query state, so a single instance can serve concurrent queries.
pub struct Pipeline {
    search: Arc<dyn SearchBackend>,
    reranker: EvidenceReranker,
    generator: Arc<dyn Generator>,
    verifier: ClaimVerifier,
    detector: ContradictionDetector,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("reranker", &self.reranker)
            .field("verifier", &self.verifier)
            .field("detector", &self.detector)
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    /// A pipeline ranking by retrieval score with heuristic-only verification.
    pub fn new(search: Arc<dyn SearchBackend>, generator: Arc<dyn Generator>, config: PipelineConfig) -> Self {
        Self {
            search,
            reranker: EvidenceReranker::retrieval_only(),
            generator,
            verifier: ClaimVerifier::heuristic(config.overlap_threshold),
            detector: ContradictionDetector::heuristic(),
            config,
        }
    }

    pub fn with_reranker(mut self, reranker: EvidenceReranker) -> Self {
        self.reranker = reranker;
        self
    }

    /// Attaches `judge` to claim verification if `llm_verify` is set.
    pub fn with_support_judge(mut self, judge: Arc<dyn SupportJudge>) -> Self {
        if self.config.llm_verify {
            self.verifier = self.verifier.with_judge(judge);
        }
        self
    }

    /// Attaches `judge` to contradiction detection if `llm_contradictions` is set.
    pub fn with_contradiction_judge(mut self, judge: Arc<dyn ContradictionJudge>) -> Self {
        if self.config.llm_contradictions {
            self.detector = self.detector.with_judge(judge);
        }
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answers `question`, or fails only when the search backend does.
    ///
    /// Every refusal, generation failure and judge failure is folded into the
    /// returned record instead.
    #[instrument(skip(self, question), fields(query_len = question.len(), baseline = %self.config.baseline))]
    pub async fn run(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        match self.config.baseline {
            Baseline::Gated => self.run_gated(question).await,
            Baseline::NaiveRag => self.run_naive_rag(question).await,
            Baseline::PromptOnly => Ok(self.run_prompt_only(question).await),
        }
    }

    async fn run_prompt_only(&self, question: &str) -> PipelineResult {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let generated = self.generator.generate_prompt_only(question).await;
        timings.llm_gen_ms = Some(elapsed_ms(started));

        match generated {
            Ok(generated) => PipelineResult::ungated(generated, Vec::new(), timings),
            Err(e) => {
                error!(error = %e, "Prompt-only generation failed");
                PipelineResult {
                    timings,
                    ..PipelineResult::failed(&e)
                }
            }
        }
    }

    async fn run_naive_rag(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let candidates = self.search.retrieve(question, self.config.rerank_k).await?;
        timings.retrieval_ms = Some(elapsed_ms(started));

        let evidence: Vec<EvidenceItem> = candidates
            .into_iter()
            .take(self.config.rerank_k)
            .map(EvidenceItem::from_retrieval)
            .collect();
        let retrieved: Vec<String> = evidence.iter().map(|e| e.paragraph_id.clone()).collect();
        debug!(num_candidates = retrieved.len(), "Retrieved candidates for naive generation");

        let started = Instant::now();
        let generated = self.generator.generate_naive(question, &evidence).await;
        timings.llm_gen_ms = Some(elapsed_ms(started));

        Ok(match generated {
            Ok(generated) => PipelineResult::ungated(generated, retrieved, timings),
            Err(e) => {
                error!(error = %e, "Naive generation failed");
                PipelineResult {
                    retrieved_paragraph_ids: retrieved,
                    timings,
                    ..PipelineResult::failed(&e)
                }
            }
        })
    }

    async fn run_gated(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        let mut notes: Vec<String> = Vec::new();
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let candidates = self.search.retrieve(question, self.config.retrieve_k).await?;
        timings.retrieval_ms = Some(elapsed_ms(started));
        debug!(num_candidates = candidates.len(), "Retrieved candidates");

        let evidence = if self.config.stages.rerank {
            let started = Instant::now();
            let outcome = self.reranker.rerank(question, candidates, self.config.rerank_k).await;
            timings.rerank_ms = Some(elapsed_ms(started));
            if outcome.fell_back {
                notes.push(notes::RERANK_FALLBACK.to_string());
            }
            outcome.evidence
        } else {
            notes.push(notes::RERANK_DISABLED.to_string());
            passthrough(candidates, self.config.rerank_k)
        };

        let confidence = compute_confidence(&evidence);
        if should_abstain(&confidence, self.config.abstain_threshold) {
            notes.push(notes::ABSTAINED_LOW_CONFIDENCE.to_string());
            return Ok(PipelineResult::abstained(confidence, evidence, notes, timings));
        }

        let started = Instant::now();
        let generated = self.generator.generate(question, &evidence).await;
        timings.llm_gen_ms = Some(elapsed_ms(started));

        let generated = match generated {
            Ok(generated) => generated,
            Err(e) => {
                error!(error = %e, "Generation failed");
                notes.push(error_note(&e));
                return Ok(PipelineResult {
                    answer: ERROR_ANSWER.to_string(),
                    citations: Vec::new(),
                    confidence,
                    evidence,
                    retrieved_paragraph_ids: Vec::new(),
                    claim_verification: None,
                    contradictions: Vec::new(),
                    notes,
                    timings,
                });
            }
        };

        let mut answer = generated.answer;
        let mut citations = if is_refusal(&answer) {
            Vec::new()
        } else {
            generated.citations
        };
        notes.extend(generated.notes);

        let mut claim_verification = None;
        if !self.config.stages.verify {
            notes.push(notes::VERIFY_DISABLED.to_string());
        } else if !is_refusal(&answer) {
            let started = Instant::now();
            let lookup = evidence_lookup(&evidence);

            let claims = split_claims(&answer);
            for id in extract_all_citations(&answer) {
                if !citations.contains(&id) {
                    citations.push(id);
                }
            }
            citations.retain(|id| lookup.contains_key(id.as_str()));

            let summary = self.verifier.verify_claims(&claims, &lookup).await;
            let outcome = enforce_support_policy(&answer, &citations, &summary, self.config.min_support_rate);

            answer = outcome.answer;
            citations = outcome.citations;
            notes.extend(outcome.notes);
            claim_verification = Some(summary);
            timings.verify_ms = Some(elapsed_ms(started));
        }

        let mut contradictions = Vec::new();
        if !self.config.stages.contradictions {
            notes.push(notes::CONTRADICTIONS_DISABLED.to_string());
        } else if !is_refusal(&answer) {
            let started = Instant::now();
            contradictions = self.detector.detect(&evidence).await;
            if !contradictions.is_empty() {
                let outcome = apply_contradiction_policy(
                    &answer,
                    &citations,
                    &contradictions,
                    self.config.contradiction_policy,
                );
                answer = outcome.answer;
                citations = outcome.citations;
                notes.extend(outcome.notes);
            }
            timings.contradictions_ms = Some(elapsed_ms(started));
        }

        info!(
            abstained = is_refusal(&answer),
            citations = citations.len(),
            support_rate = claim_verification.as_ref().map(|s| s.support_rate),
            contradictions = contradictions.len(),
            "Pipeline complete"
        );

        Ok(PipelineResult {
            answer,
            citations,
            confidence,
            evidence,
            retrieved_paragraph_ids: Vec::new(),
            claim_verification,
            contradictions,
            notes,
            timings,
        })
    }
}

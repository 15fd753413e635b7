//! Citegate batch entrypoint: answers every query in a JSONL file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mimalloc::MiMalloc;
use serde::Serialize;
use uuid::Uuid;

use citegate::config::Config;
use citegate::embedding::{Reranker, RerankerConfig};
use citegate::evidence::EvidenceReranker;
use citegate::generate::{ExtractiveGenerator, Generator, LlmGenerator};
use citegate::judge::{GenaiClient, LlmClient, LlmJudge};
use citegate::metrics::EvalSummary;
use citegate::pipeline::{
    Baseline, BatchSummary, Pipeline, PipelineConfig, append_records, load_queries, load_records, pending_queries,
    run_batch, write_records,
};
use citegate::retrieval::Bm25Index;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MANIFEST_FILE: &str = "run_manifest.json";

#[derive(Debug, Serialize)]
struct RunManifest<'a> {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    generator: &'a str,
    model: &'a str,
    reranker: bool,
    pipeline: &'a PipelineConfig,
    /// Records carried over from an earlier, interrupted run.
    resumed: usize,
    summary: BatchSummary,
    metrics: EvalSummary,
}

fn load_reranker(config: &Config) -> EvidenceReranker {
    match &config.reranker_path {
        Some(path) => match Reranker::load(RerankerConfig::new(path.clone())) {
            Ok(model) => EvidenceReranker::new(Arc::new(model)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load reranker, ranking by retrieval score");
                EvidenceReranker::retrieval_only()
            }
        },
        None => {
            tracing::warn!("No CITEGATE_RERANKER_PATH configured, ranking by retrieval score");
            EvidenceReranker::retrieval_only()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let pipeline_config = PipelineConfig::from_env()?;
    pipeline_config.validate()?;

    let baseline = pipeline_config.baseline;
    if baseline == Baseline::PromptOnly && config.extractive {
        anyhow::bail!("the prompt_only baseline needs a language model, unset CITEGATE_EXTRACTIVE");
    }

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(
        %run_id,
        %baseline,
        corpus = %config.corpus_path.display(),
        queries = %config.queries_path.display(),
        "Citegate run starting"
    );

    let index = match baseline {
        Baseline::PromptOnly => Bm25Index::from_paragraphs(Vec::new()),
        Baseline::NaiveRag | Baseline::Gated => Bm25Index::load(&config.corpus_path)?,
    };

    let reranker = match baseline {
        Baseline::Gated => load_reranker(&config),
        Baseline::PromptOnly | Baseline::NaiveRag => EvidenceReranker::retrieval_only(),
    };
    let reranker_loaded = reranker.has_scorer();

    let client: Arc<dyn LlmClient> = Arc::new(GenaiClient::new(
        config.llm_model.clone(),
        config.temperature,
        config.max_tokens,
    ));
    let (generator, generator_name): (Arc<dyn Generator>, &str) = if config.extractive {
        (Arc::new(ExtractiveGenerator::new()), "extractive")
    } else {
        (Arc::new(LlmGenerator::new(client.clone())), "llm")
    };

    let mut pipeline = Pipeline::new(Arc::new(index), generator, pipeline_config).with_reranker(reranker);
    if pipeline.config().uses_llm_judges() {
        let judge = Arc::new(LlmJudge::open(client, config.cache_dir.as_deref())?);
        pipeline = pipeline
            .with_support_judge(judge.clone())
            .with_contradiction_judge(judge);
    }

    let mut records = if config.force {
        Vec::new()
    } else {
        load_records(&config.output_path)?
    };
    let resumed = records.len();

    let queries = pending_queries(load_queries(&config.queries_path)?, &records);
    let fresh = run_batch(&pipeline, queries, config.concurrency).await;
    if config.force {
        write_records(&config.output_path, &fresh)?;
    } else {
        append_records(&config.output_path, &fresh)?;
    }
    records.extend(fresh);

    let summary = BatchSummary::from_records(&records);
    let metrics = EvalSummary::from_records(&records);
    let manifest = RunManifest {
        run_id,
        started_at,
        finished_at: Utc::now(),
        generator: generator_name,
        model: &config.llm_model,
        reranker: reranker_loaded,
        pipeline: pipeline.config(),
        resumed,
        summary,
        metrics,
    };
    let manifest_path = config
        .output_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    tracing::info!(
        %run_id,
        total = summary.total,
        answered = summary.answered,
        abstained = summary.abstained,
        errored = summary.errored,
        resumed,
        answer_rate = metrics.answer_rate,
        abstention_accuracy = metrics.abstention_accuracy,
        output = %config.output_path.display(),
        "Citegate run complete"
    );

    Ok(())
}

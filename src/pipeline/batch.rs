use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use futures_util::StreamExt;
use futures_util::stream;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::error::PipelineError;
use super::orchestrator::Pipeline;
use super::types::PipelineResult;

/// One line of the batch input.
///
/// `category` is `answerable`, `unanswerable` or `contradiction` in labelled
/// sets. `gold_paragraph_ids` accepts a list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_id_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gold_paragraph_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdList {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let ids = match Option::<IdList>::deserialize(deserializer)? {
        Some(IdList::List(ids)) => ids,
        Some(IdList::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };
    Ok(ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && !id.eq_ignore_ascii_case("nan"))
        .collect())
}

/// One line of the batch output: the query plus its flattened result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub query_id: String,
    pub question: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_id_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gold_paragraph_ids: Vec<String>,
    pub is_abstained: bool,
    #[serde(flatten)]
    pub result: PipelineResult,
}

impl BatchRecord {
    pub fn new(query: QueryRecord, result: PipelineResult) -> Self {
        Self {
            is_abstained: result.is_abstained(),
            query_id: query.query_id,
            question: query.question,
            category: query.category,
            gold_paragraph_ids: query.gold_paragraph_ids,
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub answered: usize,
    pub abstained: usize,
    pub errored: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        records.iter().fold(
            Self {
                total: records.len(),
                ..Self::default()
            },
            |mut acc, record| {
                if record.result.is_error() {
                    acc.errored += 1;
                } else if record.is_abstained {
                    acc.abstained += 1;
                } else {
                    acc.answered += 1;
                }
                acc
            },
        )
    }
}

/// Runs every query with at most `concurrency` in flight.
///
/// Output order follows completion, not input. A query whose retrieval fails
/// becomes an `ERROR` record and the rest of the batch carries on.
pub async fn run_batch(pipeline: &Pipeline, queries: Vec<QueryRecord>, concurrency: usize) -> Vec<BatchRecord> {
    let total = queries.len();
    info!(queries = total, concurrency, "Starting batch");

    let records: Vec<BatchRecord> = stream::iter(queries)
        .map(|query| async move {
            let result = match pipeline.run(&query.question).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(query_id = %query.query_id, error = %e, "Query failed");
                    PipelineResult::failed(&e)
                }
            };
            BatchRecord::new(query, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let summary = BatchSummary::from_records(&records);
    info!(
        total = summary.total,
        answered = summary.answered,
        abstained = summary.abstained,
        errored = summary.errored,
        "Batch complete"
    );

    records
}

/// Reads a JSONL query file. Blank lines are skipped.
pub fn load_queries(path: impl AsRef<Path>) -> Result<Vec<QueryRecord>, PipelineError> {
    let reader = BufReader::new(File::open(path.as_ref())?);

    let mut queries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let query = serde_json::from_str(&line).map_err(|e| PipelineError::InvalidQuery {
            line: index + 1,
            reason: e.to_string(),
        })?;
        queries.push(query);
    }

    Ok(queries)
}

/// Reads the records of an earlier run so it can be resumed.
///
/// A missing file is an empty run. Lines that do not parse, such as one cut
/// short by a crash, are skipped.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<BatchRecord>, PipelineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Skipped unreadable output lines");
    }
    Ok(records)
}

/// Drops queries whose `query_id` already has a record.
pub fn pending_queries(queries: Vec<QueryRecord>, done: &[BatchRecord]) -> Vec<QueryRecord> {
    let done: HashSet<&str> = done.iter().map(|r| r.query_id.as_str()).collect();
    let (pending, skipped): (Vec<_>, Vec<_>) = queries
        .into_iter()
        .partition(|q| !done.contains(q.query_id.as_str()));

    if !skipped.is_empty() {
        info!(skipped = skipped.len(), pending = pending.len(), "Resuming from earlier output");
    }
    pending
}

/// Writes one JSON object per line, replacing `path`. Parent directories are
/// created as needed.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    create_parent(path)?;
    write_lines(File::create(path)?, records)
}

/// Like [`write_records`], but appends to an existing file.
pub fn append_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    create_parent(path)?;
    write_lines(OpenOptions::new().create(true).append(true).open(path)?, records)
}

fn create_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_lines<T: Serialize>(file: File, records: &[T]) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(())
}

//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CITEGATE_*` environment variables.
//! Decision thresholds live in [`crate::pipeline::PipelineConfig`]; this module
//! covers process wiring (files, model, concurrency).

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CITEGATE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Paragraph records for the BM25 backend. Default: `./data/paragraphs.jsonl`.
    pub corpus_path: PathBuf,

    /// Batch input, one `{query_id, question, category?, gold_paragraph_ids?}` per line. Default: `./data/queries.jsonl`.
    pub queries_path: PathBuf,

    /// Batch output. Default: `./runs/predictions.jsonl`.
    pub output_path: PathBuf,

    /// Cross-encoder directory (BERT + tokenizer). Unset means retrieval-score fallback.
    pub reranker_path: Option<PathBuf>,

    /// Directory for the judge JSONL caches. Unset means in-memory only.
    pub cache_dir: Option<PathBuf>,

    /// Model name handed to `genai`. Default: `gpt-4o-mini`.
    pub llm_model: String,

    pub temperature: f64,

    pub max_tokens: u32,

    /// Use the offline extractive generator instead of the LLM.
    pub extractive: bool,

    /// Queries in flight at once during a batch. Default: `4`.
    pub concurrency: usize,

    /// Discard earlier output instead of resuming from it.
    pub force: bool,
}

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("./data/paragraphs.jsonl"),
            queries_path: PathBuf::from("./data/queries.jsonl"),
            output_path: PathBuf::from("./runs/predictions.jsonl"),
            reranker_path: None,
            cache_dir: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 800,
            extractive: false,
            concurrency: 4,
            force: false,
        }
    }
}

impl Config {
    const ENV_CORPUS_PATH: &'static str = "CITEGATE_CORPUS_PATH";
    const ENV_QUERIES_PATH: &'static str = "CITEGATE_QUERIES_PATH";
    const ENV_OUTPUT_PATH: &'static str = "CITEGATE_OUTPUT_PATH";
    const ENV_RERANKER_PATH: &'static str = "CITEGATE_RERANKER_PATH";
    const ENV_CACHE_DIR: &'static str = "CITEGATE_CACHE_DIR";
    const ENV_LLM_MODEL: &'static str = "CITEGATE_LLM_MODEL";
    const ENV_TEMPERATURE: &'static str = "CITEGATE_TEMPERATURE";
    const ENV_MAX_TOKENS: &'static str = "CITEGATE_MAX_TOKENS";
    const ENV_EXTRACTIVE: &'static str = "CITEGATE_EXTRACTIVE";
    const ENV_CONCURRENCY: &'static str = "CITEGATE_CONCURRENCY";
    const ENV_FORCE: &'static str = "CITEGATE_FORCE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let concurrency = parse_from_env(Self::ENV_CONCURRENCY, defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::ZeroCount {
                name: Self::ENV_CONCURRENCY,
            });
        }

        Ok(Self {
            corpus_path: path_from_env(Self::ENV_CORPUS_PATH, defaults.corpus_path),
            queries_path: path_from_env(Self::ENV_QUERIES_PATH, defaults.queries_path),
            output_path: path_from_env(Self::ENV_OUTPUT_PATH, defaults.output_path),
            reranker_path: optional_path_from_env(Self::ENV_RERANKER_PATH),
            cache_dir: optional_path_from_env(Self::ENV_CACHE_DIR),
            llm_model: env::var(Self::ENV_LLM_MODEL)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.llm_model),
            temperature: parse_from_env(Self::ENV_TEMPERATURE, defaults.temperature)?,
            max_tokens: parse_from_env(Self::ENV_MAX_TOKENS, defaults.max_tokens)?,
            extractive: bool_from_env(Self::ENV_EXTRACTIVE, defaults.extractive)?,
            concurrency,
            force: bool_from_env(Self::ENV_FORCE, defaults.force)?,
        })
    }

    /// Validates optional paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.reranker_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.cache_dir
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        if self.queries_path.exists() && !self.queries_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.queries_path.clone(),
            });
        }

        Ok(())
    }
}

pub(crate) fn path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
    env::var(var_name).map(PathBuf::from).unwrap_or(default)
}

pub(crate) fn optional_path_from_env(var_name: &str) -> Option<PathBuf> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parses `var_name` if set. A malformed value is an error, not the default.
pub(crate) fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: var_name,
            reason: e.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(var_name) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: var_name,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

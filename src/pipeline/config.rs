use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, bool_from_env, parse_from_env};
use crate::constants::{
    DEFAULT_ABSTAIN_THRESHOLD, DEFAULT_MIN_SUPPORT_RATE, DEFAULT_OVERLAP_THRESHOLD, DEFAULT_RERANK_K,
    DEFAULT_RETRIEVE_K,
};
use crate::contradiction::ContradictionPolicy;

/// Which system answers the query.
///
/// `Gated` is the full pipeline. The other two are comparison baselines that
/// skip every gate: `NaiveRag` retrieves and generates, `PromptOnly` asks the
/// model with no evidence at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    PromptOnly,
    NaiveRag,
    #[default]
    Gated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown baseline `{0}`, expected `prompt_only` (b1), `naive_rag` (b2) or `gated` (b3)")]
pub struct UnknownBaseline(pub String);

impl FromStr for Baseline {
    type Err = UnknownBaseline;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt_only" | "b1" => Ok(Baseline::PromptOnly),
            "naive_rag" | "b2" => Ok(Baseline::NaiveRag),
            "gated" | "b3" => Ok(Baseline::Gated),
            _ => Err(UnknownBaseline(s.to_string())),
        }
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Baseline::PromptOnly => "prompt_only",
            Baseline::NaiveRag => "naive_rag",
            Baseline::Gated => "gated",
        })
    }
}

/// Which optional stages run. All on by default; turning one off is an ablation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageToggles {
    pub rerank: bool,
    pub verify: bool,
    pub contradictions: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            rerank: true,
            verify: true,
            contradictions: true,
        }
    }
}

/// Decision parameters for one [`super::Pipeline`]. Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub baseline: Baseline,
    /// Candidates requested from the search backend.
    pub retrieve_k: usize,
    /// Evidence kept after reranking.
    pub rerank_k: usize,
    /// Refuse before generation when the best rerank score is below this.
    pub abstain_threshold: f32,
    pub min_support_rate: f32,
    /// Minimum content-word Jaccard for tier-1 support.
    pub overlap_threshold: f32,
    pub contradiction_policy: ContradictionPolicy,
    /// Attach the model judge to claim verification.
    pub llm_verify: bool,
    /// Attach the model judge to contradiction detection.
    pub llm_contradictions: bool,
    pub stages: StageToggles,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline: Baseline::default(),
            retrieve_k: DEFAULT_RETRIEVE_K,
            rerank_k: DEFAULT_RERANK_K,
            abstain_threshold: DEFAULT_ABSTAIN_THRESHOLD,
            min_support_rate: DEFAULT_MIN_SUPPORT_RATE,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            contradiction_policy: ContradictionPolicy::default(),
            llm_verify: false,
            llm_contradictions: false,
            stages: StageToggles::default(),
        }
    }
}

impl PipelineConfig {
    const ENV_BASELINE: &'static str = "CITEGATE_BASELINE";
    const ENV_RETRIEVE_K: &'static str = "CITEGATE_RETRIEVE_K";
    const ENV_RERANK_K: &'static str = "CITEGATE_RERANK_K";
    const ENV_ABSTAIN_THRESHOLD: &'static str = "CITEGATE_ABSTAIN_THRESHOLD";
    const ENV_MIN_SUPPORT_RATE: &'static str = "CITEGATE_MIN_SUPPORT_RATE";
    const ENV_OVERLAP_THRESHOLD: &'static str = "CITEGATE_OVERLAP_THRESHOLD";
    const ENV_CONTRADICTION_POLICY: &'static str = "CITEGATE_CONTRADICTION_POLICY";
    const ENV_LLM_VERIFY: &'static str = "CITEGATE_LLM_VERIFY";
    const ENV_LLM_CONTRADICTIONS: &'static str = "CITEGATE_LLM_CONTRADICTIONS";
    const ENV_NO_RERANK: &'static str = "CITEGATE_NO_RERANK";
    const ENV_NO_VERIFY: &'static str = "CITEGATE_NO_VERIFY";
    const ENV_NO_CONTRADICTIONS: &'static str = "CITEGATE_NO_CONTRADICTIONS";

    /// Reads `CITEGATE_*` overrides on top of defaults. Does not call [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let contradiction_policy = match std::env::var(Self::ENV_CONTRADICTION_POLICY) {
            Ok(value) => value.parse().map_err(|e: crate::contradiction::UnknownPolicy| {
                ConfigError::InvalidValue {
                    name: Self::ENV_CONTRADICTION_POLICY,
                    reason: e.to_string(),
                    value,
                }
            })?,
            Err(_) => defaults.contradiction_policy,
        };

        let baseline = match std::env::var(Self::ENV_BASELINE) {
            Ok(value) => value.parse().map_err(|e: UnknownBaseline| ConfigError::InvalidValue {
                name: Self::ENV_BASELINE,
                reason: e.to_string(),
                value,
            })?,
            Err(_) => defaults.baseline,
        };

        Ok(Self {
            baseline,
            retrieve_k: parse_from_env(Self::ENV_RETRIEVE_K, defaults.retrieve_k)?,
            rerank_k: parse_from_env(Self::ENV_RERANK_K, defaults.rerank_k)?,
            abstain_threshold: parse_from_env(Self::ENV_ABSTAIN_THRESHOLD, defaults.abstain_threshold)?,
            min_support_rate: parse_from_env(Self::ENV_MIN_SUPPORT_RATE, defaults.min_support_rate)?,
            overlap_threshold: parse_from_env(Self::ENV_OVERLAP_THRESHOLD, defaults.overlap_threshold)?,
            contradiction_policy,
            llm_verify: bool_from_env(Self::ENV_LLM_VERIFY, defaults.llm_verify)?,
            llm_contradictions: bool_from_env(Self::ENV_LLM_CONTRADICTIONS, defaults.llm_contradictions)?,
            stages: StageToggles {
                rerank: !bool_from_env(Self::ENV_NO_RERANK, false)?,
                verify: !bool_from_env(Self::ENV_NO_VERIFY, false)?,
                contradictions: !bool_from_env(Self::ENV_NO_CONTRADICTIONS, false)?,
            },
        })
    }

    /// `true` when a tier-2 judge would be attached, so its caches are worth opening.
    pub fn uses_llm_judges(&self) -> bool {
        self.baseline == Baseline::Gated && (self.llm_verify || self.llm_contradictions)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            (Self::ENV_ABSTAIN_THRESHOLD, self.abstain_threshold),
            (Self::ENV_MIN_SUPPORT_RATE, self.min_support_rate),
            (Self::ENV_OVERLAP_THRESHOLD, self.overlap_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.retrieve_k == 0 {
            return Err(ConfigError::ZeroCount {
                name: Self::ENV_RETRIEVE_K,
            });
        }
        if self.rerank_k == 0 {
            return Err(ConfigError::ZeroCount {
                name: Self::ENV_RERANK_K,
            });
        }
        if self.rerank_k > self.retrieve_k {
            return Err(ConfigError::RerankExceedsRetrieve {
                rerank_k: self.rerank_k,
                retrieve_k: self.retrieve_k,
            });
        }

        Ok(())
    }
}

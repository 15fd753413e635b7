pub mod config;
pub mod error;


pub use config::{DEFAULT_MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;

use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::bert::CrossEncoderModel;
use crate::embedding::device::select_device;
use crate::embedding::tokenizer::load_pair_tokenizer;

/// Cross-encoder relevance model.
///
/// Scores are raw, unbounded logits. Squashing into `(0, 1)` is the caller's
/// job (see [`crate::evidence::EvidenceReranker`]).
pub struct Reranker {
    device: candle_core::Device,
    config: RerankerConfig,
    model: Option<(CrossEncoderModel, Tokenizer)>,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for reranker");

        let Some(ref model_path) = config.model_path else {
            info!("No reranker model path configured, operating in stub mode");
            return Ok(Self {
                device,
                config,
                model: None,
            });
        };

        for required in ["config.json", "model.safetensors"] {
            if !model_path.join(required).exists() {
                return Err(RerankerError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", required, model_path.display()),
                });
            }
        }

        info!(model_path = %model_path.display(), "Loading reranker model");

        let model = CrossEncoderModel::load(model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load cross-encoder: {}", e),
            }
        })?;
        let tokenizer = load_pair_tokenizer(model_path, config.max_seq_len)?;

        info!("Reranker model loaded successfully");

        Ok(Self {
            device,
            config,
            model: Some((model, tokenizer)),
        })
    }

    pub fn stub() -> Result<Self, RerankerError> {
        Self::load(RerankerConfig::stub())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }

    /// Raw relevance logit for one query/passage pair.
    pub fn score(&self, query: &str, passage: &str) -> Result<f32, RerankerError> {
        let Some((model, tokenizer)) = &self.model else {
            return Err(RerankerError::NotAvailable {
                reason: "no cross-encoder model loaded".to_string(),
            });
        };

        let tokens = tokenizer.encode((query, passage), true).map_err(|e| {
            RerankerError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let input_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = model
            .forward(&input_ids, &type_ids, Some(&attention_mask))
            .map_err(|e| RerankerError::InferenceFailed {
                reason: e.to_string(),
            })?;

        logits
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "model returned an empty logit tensor".to_string(),
            })
    }

    /// Scores every passage against `query`, preserving input order.
    pub fn score_batch(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankerError> {
        debug!(
            query_len = query.len(),
            num_passages = passages.len(),
            "Scoring passages with cross-encoder"
        );

        passages
            .iter()
            .map(|passage| self.score(query, passage))
            .collect()
    }
}

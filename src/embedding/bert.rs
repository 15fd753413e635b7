use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;
use std::sync::Arc;

/// Tensor prefixes used by the cross-encoder checkpoints we accept.
const ENCODER_PREFIXES: [&str; 2] = ["bert", "roberta"];

struct CrossEncoderInner {
    encoder: BertModel,
    head: Linear,
}

impl CrossEncoderInner {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let prefix = ENCODER_PREFIXES.iter().find(|prefix| {
            vb.contains_tensor(&format!("{prefix}.embeddings.word_embeddings.weight"))
        });

        let encoder = match prefix {
            Some(prefix) => BertModel::load(vb.pp(*prefix), config)?,
            None => BertModel::load(vb.clone(), config)?,
        };

        // ms-marco style checkpoints emit a single relevance logit.
        let head = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;

        Ok(Self { encoder, head })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, attention_mask)?;
        let cls = hidden.i((.., 0, ..))?;
        self.head.forward(&cls)
    }
}

/// BERT encoder with a one-logit classification head over the `[CLS]` token.
#[derive(Clone)]
pub struct CrossEncoderModel(Arc<CrossEncoderInner>);

impl CrossEncoderModel {
    /// Loads `config.json` + `model.safetensors` from `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let weights = [model_dir.join("model.safetensors")];
        // SAFETY: the safetensors file is opened read-only and not mutated while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, DType::F32, device)? };

        Ok(Self(Arc::new(CrossEncoderInner::load(vb, &config)?)))
    }

    /// Returns a `[batch, 1]` tensor of raw relevance logits.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.0.forward(input_ids, token_type_ids, attention_mask)
    }
}

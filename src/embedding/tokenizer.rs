use std::path::Path;

use tokenizers::{Tokenizer, TruncationParams};

use super::error::EmbeddingError;

/// Loads `tokenizer.json` from a cross-encoder directory with pair truncation enabled.
///
/// Query/passage pairs longer than `max_len` tokens are truncated from the
/// longer side, so long paragraphs never fail inference.
pub fn load_pair_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer, EmbeddingError> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    if !tokenizer_path.exists() {
        return Err(EmbeddingError::ModelNotFound {
            path: tokenizer_path,
        });
    }

    let mut tokenizer =
        Tokenizer::from_file(&tokenizer_path).map_err(|e| EmbeddingError::TokenizerUnavailable {
            reason: e.to_string(),
        })?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| EmbeddingError::TokenizerUnavailable {
            reason: format!("failed to configure truncation: {}", e),
        })?;

    Ok(tokenizer)
}

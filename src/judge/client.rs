use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::debug;

use super::error::LlmError;

/// A chat model behind a single system + user round-trip.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    fn model(&self) -> &str;
}

/// [`LlmClient`] backed by `genai`, which picks the provider from the model
/// name and reads its API key from the environment.
pub struct GenaiClient {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GenaiClient {
    pub fn new(model: impl Into<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            options: ChatOptions::default()
                .with_temperature(temperature)
                .with_max_tokens(max_tokens),
        }
    }
}

#[async_trait]
impl LlmClient for GenaiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)]);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        debug!(model = %self.model, response_len = text.len(), "LLM call completed");

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

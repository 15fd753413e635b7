use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::LlmClient;
use super::error::LlmError;

/// Scripted [`LlmClient`] for tests.
///
/// Responses are served in order. Once the script is exhausted the fallback
/// response is returned, or an error if none is set.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers `text` after the script runs out.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, reason: impl Into<String>) -> Self {
        self.script.lock().push_back(Err(reason.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `(system, user)` prompts received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.calls.lock().push((system.to_string(), user.to_string()));

        match self.script.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(LlmError::RequestFailed { reason }),
            None => self.fallback.clone().ok_or(LlmError::EmptyResponse),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::SearchBackend;
use super::error::SearchError;
use crate::evidence::Candidate;

/// [`SearchBackend`] returning a fixed candidate list (truncated to `k`).
#[derive(Debug, Default)]
pub struct MockSearchBackend {
    candidates: Vec<Candidate>,
    fail: Option<String>,
    calls: AtomicUsize,
}

impl MockSearchBackend {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<Candidate>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail {
            return Err(SearchError::Backend {
                reason: reason.clone(),
            });
        }
        Ok(self.candidates.iter().take(k).cloned().collect())
    }
}

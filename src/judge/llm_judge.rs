use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::cache::JudgeCache;
use super::client::LlmClient;
use super::error::JudgeError;
use super::parse::parse_json_response;
use super::prompts::{
    CLAIM_SYSTEM_PROMPT, CONTRADICTION_SYSTEM_PROMPT, claim_user_prompt, contradiction_user_prompt,
};
use crate::contradiction::{ContradictionJudge, ContradictionVerdict};
use crate::evidence::EvidenceItem;
use crate::hashing::{claim_judge_key, contradiction_judge_key};
use crate::verify::{SupportJudge, SupportVerdict};

pub const CLAIM_CACHE_FILE: &str = "llm_claim_verify.jsonl";
pub const CONTRADICTION_CACHE_FILE: &str = "llm_contradictions.jsonl";

/// Model-backed tier-2 judge for both claim support and contradictions.
///
/// Verdicts are memoised by a hash of the exact judge inputs. Only well-formed
/// verdicts are cached; a failed call is retried the next time it is asked.
#[derive(Clone)]
pub struct LlmJudge {
    client: Arc<dyn LlmClient>,
    claim_cache: Arc<JudgeCache>,
    contradiction_cache: Arc<JudgeCache>,
}

impl std::fmt::Debug for LlmJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmJudge")
            .field("model", &self.client.model())
            .field("claim_cache", &self.claim_cache)
            .field("contradiction_cache", &self.contradiction_cache)
            .finish()
    }
}

impl LlmJudge {
    /// A judge with process-local caches.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            claim_cache: Arc::new(JudgeCache::in_memory()),
            contradiction_cache: Arc::new(JudgeCache::in_memory()),
        }
    }

    /// A judge whose caches persist under `cache_dir`, or in memory when `None`.
    pub fn open(client: Arc<dyn LlmClient>, cache_dir: Option<&Path>) -> Result<Self, JudgeError> {
        let Some(dir) = cache_dir else {
            return Ok(Self::new(client));
        };

        Ok(Self {
            client,
            claim_cache: Arc::new(JudgeCache::open(dir.join(CLAIM_CACHE_FILE))?),
            contradiction_cache: Arc::new(JudgeCache::open(dir.join(CONTRADICTION_CACHE_FILE))?),
        })
    }

    pub fn with_caches(mut self, claim_cache: Arc<JudgeCache>, contradiction_cache: Arc<JudgeCache>) -> Self {
        self.claim_cache = claim_cache;
        self.contradiction_cache = contradiction_cache;
        self
    }

    async fn judge<T>(&self, cache: &JudgeCache, key: &str, system: &str, user: &str) -> Result<T, JudgeError>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(entry) = cache.lookup(key) {
            match serde_json::from_value::<T>(entry) {
                Ok(verdict) => return Ok(verdict),
                Err(e) => debug!(key, error = %e, "Ignoring unreadable judge cache entry"),
            }
        }

        let raw = self.client.complete(system, user).await?;
        let verdict: T = serde_json::from_value(parse_json_response(&raw)?)?;

        match serde_json::to_value(&verdict) {
            Ok(entry) => {
                if let Err(e) = cache.append(key, entry) {
                    warn!(error = %e, "Failed to persist judge verdict");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode judge verdict"),
        }

        Ok(verdict)
    }
}

#[async_trait]
impl SupportJudge for LlmJudge {
    async fn judge_claim(&self, claim: &str, cited_texts: &[&str]) -> Result<SupportVerdict, JudgeError> {
        let key = claim_judge_key(claim, cited_texts);
        let user = claim_user_prompt(claim, cited_texts);
        self.judge(&self.claim_cache, &key, CLAIM_SYSTEM_PROMPT, &user).await
    }
}

#[async_trait]
impl ContradictionJudge for LlmJudge {
    async fn judge_pair(&self, a: &EvidenceItem, b: &EvidenceItem) -> Result<ContradictionVerdict, JudgeError> {
        let key = contradiction_judge_key(
            (a.paragraph_id.as_str(), a.text.as_str()),
            (b.paragraph_id.as_str(), b.text.as_str()),
        );
        let user = contradiction_user_prompt(a, b);
        self.judge(&self.contradiction_cache, &key, CONTRADICTION_SYSTEM_PROMPT, &user)
            .await
    }
}

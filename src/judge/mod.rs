//! Tier-2 model judges.
//!
//! [`LlmJudge`] implements both [`crate::verify::SupportJudge`] and
//! [`crate::contradiction::ContradictionJudge`] over any [`LlmClient`], with a
//! [`JudgeCache`] per judgement kind.

pub mod cache;
pub mod client;
pub mod error;
pub mod llm_judge;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod prompts;


pub use cache::JudgeCache;
pub use client::{GenaiClient, LlmClient};
pub use error::{JudgeError, LlmError};
pub use llm_judge::{CLAIM_CACHE_FILE, CONTRADICTION_CACHE_FILE, LlmJudge};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLlmClient;
pub use parse::{parse_json_response, strip_code_fences};

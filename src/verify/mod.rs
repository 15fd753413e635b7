//! Claim verification and the support policy.
//!
//! Every claim is checked against the paragraphs it cites. A tier-2 judge is
//! consulted first when configured; the tier-1 keyword heuristic is the
//! deterministic fallback and never fails.

mod heuristic;
mod policy;
mod types;
mod verifier;


pub use heuristic::{HeuristicVerdict, NO_CITED_PARAGRAPHS, content_tokens, numeric_tokens, verify_heuristic};
pub use policy::enforce_support_policy;
pub use types::{ClaimVerdict, PolicyOutcome, SupportVerdict, Tier, VerificationSummary};
pub use verifier::{ClaimVerifier, SupportJudge, evidence_lookup};

//! Contradiction detection between evidence paragraphs, and the policy that
//! decides whether a conflicted answer is surfaced or refused.

mod detector;
mod heuristic;
mod policy;
mod types;


pub use detector::{ContradictionDetector, ContradictionJudge, score_signals};
pub use heuristic::{heuristic_signals, negation_conflicts, numeric_conflicts};
pub use policy::apply_contradiction_policy;
pub use types::{
    ContradictionConfidence, ContradictionPolicy, ContradictionRecord, ContradictionVerdict, UnknownPolicy,
};

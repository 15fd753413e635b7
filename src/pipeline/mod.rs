//! Pipeline orchestration.
//!
//! ```text
//! RETRIEVE -> RERANK -> GATE -> { ABSTAINED | GENERATE }
//!          -> { ERROR | VERIFY } -> { ABSTAINED | CONTRADICT } -> FINAL
//! ```
//!
//! Each query runs independently. The only state shared across concurrent
//! runs is the optional judge cache behind the tier-2 judges.

mod batch;
mod config;
mod error;
mod orchestrator;
mod types;

#[cfg(test)]
mod tests;

pub use batch::{
    BatchRecord, BatchSummary, QueryRecord, append_records, load_queries, load_records, pending_queries, run_batch,
    write_records,
};
pub use config::{Baseline, PipelineConfig, StageToggles, UnknownBaseline};
pub use error::PipelineError;
pub use orchestrator::Pipeline;
pub use types::{PipelineResult, StageTimings};

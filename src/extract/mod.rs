//! Extraction pipeline: graph building and batch orchestration

mod builder;
mod orchestrator;
mod stats;

pub use builder::GraphBuilder;
pub use orchestrator::{BatchOrchestrator, ExtractorBuilder, PageState, WorkSelector};
pub use stats::{RunSummary, WorkStats};

use crate::source::SourceError;
use thiserror::Error;

/// Errors a batch run can propagate to its caller.
///
/// Everything page-level is recovered locally and reported in the run
/// summary; only wiring problems and an unreachable segment store at
/// startup surface here.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

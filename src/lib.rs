//! Shakla: Discourse Graph Extraction Engine
//!
//! Ingests a corpus of short, ordered text segments belonging to pages of
//! argumentative discourse and produces a structured, ordered discourse
//! graph: one summary unit per page plus typed argumentation steps connected
//! by leads-to and contains edges.
//!
//! # Pipeline
//!
//! Segments → page grouping → content normalization → structural analysis
//! (heuristic or completion-assisted) → response validation → graph
//! persistence, orchestrated per page and per work with page-local failure
//! isolation.
//!
//! # Example
//!
//! ```no_run
//! use shakla::{
//!     AnalyzerConfig, BatchOrchestrator, HeuristicAnalyzer, InMemorySegmentStore,
//!     OpenStore, SqliteStore, WorkSelector,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = BatchOrchestrator::builder()
//!     .segments(Arc::new(InMemorySegmentStore::new(vec![])))
//!     .analyzer(Arc::new(HeuristicAnalyzer::new(AnalyzerConfig::default())))
//!     .store(Arc::new(SqliteStore::open_in_memory()?))
//!     .build()?;
//! let summary = orchestrator.run(WorkSelector::All, None, None).await?;
//! println!("saved {} pages", summary.saved);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod completion;
pub mod extract;
mod graph;
pub mod source;
pub mod storage;

pub use analysis::{
    validate, AnalyzerConfig, AssistedAnalyzer, HeuristicAnalyzer, RawAnalysis,
    StructuralAnalyzer, ValidatedAnalysis,
};
pub use completion::{CompletionClient, CompletionError, MockCompletion, SubprocessCompletion};
pub use extract::{
    BatchOrchestrator, ExtractError, ExtractorBuilder, GraphBuilder, PageState, RunSummary,
    WorkSelector, WorkStats,
};
pub use graph::{DiscourseUnit, EdgeKind, ExtractionStrategy, GraphEdge, StepNode, StepType};
pub use source::{
    group_pages, ContentNormalizer, FileSegmentStore, InMemorySegmentStore, PageGroup, Segment,
    SegmentStore, SourceError,
};
pub use storage::{DiscourseStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Structural analysis of page content
//!
//! Two strategies implement one contract ([`StructuralAnalyzer`]): the
//! deterministic [`HeuristicAnalyzer`] and the completion-backed
//! [`AssistedAnalyzer`]. Raw analyzer output is canonicalized by
//! [`validate`] before anything reaches storage.

mod assisted;
mod heuristic;
mod traits;
mod types;
mod validate;

pub use assisted::AssistedAnalyzer;
pub use heuristic::HeuristicAnalyzer;
pub use traits::StructuralAnalyzer;
pub use types::{AnalysisError, AnalyzerConfig, RawAnalysis, RawStep};
pub use validate::{validate, ValidatedAnalysis};

//! Analyzer trait defining the structural analysis contract

use super::types::{AnalysisError, RawAnalysis};
use crate::graph::ExtractionStrategy;
use async_trait::async_trait;

/// One contract for every analysis strategy: page content in, canonical
/// analysis result out.
///
/// The extraction mode (completion service configured or not) is resolved
/// once at wiring time into a concrete analyzer instance; nothing downstream
/// branches on strategy flags.
#[async_trait]
pub trait StructuralAnalyzer: Send + Sync {
    /// Which strategy this analyzer implements.
    fn strategy(&self) -> ExtractionStrategy;

    /// Analyze one page's combined content.
    async fn analyze(&self, page_ref: &str, text: &str) -> Result<RawAnalysis, AnalysisError>;
}

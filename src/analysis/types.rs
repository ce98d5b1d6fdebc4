//! Shared types for the analysis pipeline

use crate::graph::ExtractionStrategy;
use serde::{Deserialize, Serialize};

/// Configuration for both analyzer strategies.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Minimum steps the heuristic guarantees, so downstream invariants
    /// always hold even on very short input
    pub min_steps: usize,
    /// Maximum clauses the heuristic scans per page (bounded work)
    pub max_steps: usize,
    /// Step-count range requested from the completion service
    pub target_steps: (usize, usize),
    /// Deadline for one completion call, in seconds
    pub completion_timeout_secs: u64,
    /// Concurrent completion calls allowed across the whole run
    pub completion_concurrency: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_steps: 2,
            max_steps: 15,
            target_steps: (10, 20),
            completion_timeout_secs: 30,
            completion_concurrency: 2,
        }
    }
}

/// One step as emitted by an analyzer, before validation.
///
/// Everything here is untrusted: the type is a free string, the parent is a
/// raw reference into the analyzer's own id space, labels may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStep {
    /// Analyzer-local id; positional when absent
    pub raw_id: Option<String>,
    pub step_type: String,
    pub label: String,
    pub speaker: Option<String>,
    pub content_preview: Option<String>,
    /// Raw reference to the step this one responds to
    pub parent: Option<String>,
}

/// Canonical analyzer output shape, shared by both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub page_ref: String,
    pub title: String,
    pub summary: String,
    pub theme: String,
    pub main_question: String,
    pub steps: Vec<RawStep>,
    /// Strategy that actually produced these steps
    pub strategy: ExtractionStrategy,
    /// True when the assisted analyzer fell back to the heuristic result
    pub fell_back: bool,
    /// Non-fatal notes accumulated along the way
    pub warnings: Vec<String>,
}

impl RawAnalysis {
    pub fn new(page_ref: impl Into<String>, strategy: ExtractionStrategy) -> Self {
        Self {
            page_ref: page_ref.into(),
            title: String::new(),
            summary: String::new(),
            theme: String::new(),
            main_question: String::new(),
            steps: Vec::new(),
            strategy,
            fell_back: false,
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Errors internal to the analysis stage.
///
/// These never cross the analyzer trait boundary for the assisted strategy —
/// every failure there degrades to the heuristic result. They surface only
/// from future strategies with no fallback of their own.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("completion failed: {0}")]
    CompletionFailed(String),

    #[error("completion timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed analysis document: {0}")]
    Malformed(String),
}

//! Segment model and the SegmentStore capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors from segment retrieval.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("work not found: {0}")]
    WorkNotFound(String),

    #[error("corpus file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An immutable unit of source text.
///
/// `id` encodes work + page + ordinal, e.g. `"Berakhot 2a:1"`. The pipeline
/// never writes segments; they belong to the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    /// Work name + page label, e.g. "Berakhot 2a"
    pub page_ref: String,
    /// Source-language text
    pub primary_text: String,
    /// Optional translation or alternate rendering
    #[serde(default)]
    pub secondary_text: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, page_ref: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            page_ref: page_ref.into(),
            primary_text: primary.into(),
            secondary_text: None,
        }
    }

    pub fn with_secondary(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }
}

/// Capability for fetching raw segments, consumed read-only.
///
/// `fetch_segments` returns segments for one work in source order, optionally
/// bounded to pages at or after `start_page` and to at most `limit` segments.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Enumerate the works this store holds segments for.
    async fn list_works(&self) -> Result<Vec<String>, SourceError>;

    /// Fetch ordered segments for a work.
    async fn fetch_segments(
        &self,
        work: &str,
        start_page: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Segment>, SourceError>;
}

/// In-memory store, used in tests and for small wired-up corpora.
#[derive(Debug, Default)]
pub struct InMemorySegmentStore {
    segments: Vec<Segment>,
}

impl InMemorySegmentStore {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    fn select(&self, work: &str, start_page: Option<&str>, limit: Option<usize>) -> Vec<Segment> {
        let work_prefix = format!("{} ", work);
        let mut hit_start = start_page.is_none();
        let mut out = Vec::new();
        for seg in &self.segments {
            if !seg.id.starts_with(&work_prefix) {
                continue;
            }
            if let Some(page) = start_page {
                if !hit_start {
                    // Match the page label exactly, not as a suffix ("2b"
                    // must not match "12b").
                    hit_start = seg.page_ref.rsplit(' ').next() == Some(page);
                }
                if !hit_start {
                    continue;
                }
            }
            out.push(seg.clone());
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
        out
    }
}

#[async_trait]
impl SegmentStore for InMemorySegmentStore {
    async fn list_works(&self) -> Result<Vec<String>, SourceError> {
        // BTreeSet gives a stable, sorted discovery order.
        let works: BTreeSet<String> = self
            .segments
            .iter()
            .filter_map(|s| s.page_ref.rsplit_once(' ').map(|(work, _)| work.to_string()))
            .collect();
        Ok(works.into_iter().collect())
    }

    async fn fetch_segments(
        &self,
        work: &str,
        start_page: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Segment>, SourceError> {
        Ok(self.select(work, start_page, limit))
    }
}

/// Store backed by a JSON corpus file: a flat array of segments.
///
/// Loads the whole corpus at open time; fine for the corpus sizes the CLI
/// works with, and keeps fetches synchronous-fast.
pub struct FileSegmentStore {
    inner: InMemorySegmentStore,
}

impl FileSegmentStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        let segments: Vec<Segment> = serde_json::from_str(&raw)?;
        Ok(Self {
            inner: InMemorySegmentStore::new(segments),
        })
    }
}

#[async_trait]
impl SegmentStore for FileSegmentStore {
    async fn list_works(&self) -> Result<Vec<String>, SourceError> {
        self.inner.list_works().await
    }

    async fn fetch_segments(
        &self,
        work: &str,
        start_page: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Segment>, SourceError> {
        self.inner.fetch_segments(work, start_page, limit).await
    }
}

//! Storage trait definitions

use crate::graph::{DiscourseUnit, GraphEdge, StepNode};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for discourse graph storage backends.
///
/// Implementations must be thread-safe (Send + Sync) to support concurrent
/// page tasks, and must serialize writes so that `replace_steps` for a given
/// `page_ref` is all-or-nothing from any reader's perspective.
pub trait DiscourseStore: Send + Sync {
    // === Unit operations ===

    /// Create or update a unit keyed by `page_ref`.
    ///
    /// Attributes are overwritten; `created_at` is preserved when the unit
    /// already exists, `updated_at` is always refreshed.
    fn upsert_unit(&self, unit: &DiscourseUnit) -> StorageResult<()>;

    /// Load a unit by page_ref.
    fn unit(&self, page_ref: &str) -> StorageResult<Option<DiscourseUnit>>;

    /// List all units, ordered by page_ref.
    fn list_units(&self) -> StorageResult<Vec<DiscourseUnit>>;

    /// Delete a unit and everything attached to it.
    fn delete_unit(&self, page_ref: &str) -> StorageResult<bool>;

    // === Step + edge operations ===

    /// Atomically replace the full step set and edge set for a page.
    ///
    /// Deletes all previously persisted steps and edges for `page_ref`, then
    /// inserts the new ones, in a single transaction. A failure partway
    /// through leaves the prior complete state untouched.
    fn replace_steps(
        &self,
        page_ref: &str,
        steps: &[StepNode],
        edges: &[GraphEdge],
    ) -> StorageResult<()>;

    /// Load a page's steps ordered by sequence.
    fn steps_for_page(&self, page_ref: &str) -> StorageResult<Vec<StepNode>>;

    /// Load a page's edges.
    fn edges_for_page(&self, page_ref: &str) -> StorageResult<Vec<GraphEdge>>;
}

/// Extension trait for opening stores from paths.
pub trait OpenStore: DiscourseStore + Sized {
    /// Open or create a store at the given path.
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing).
    fn open_in_memory() -> StorageResult<Self>;
}

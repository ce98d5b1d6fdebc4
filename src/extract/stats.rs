//! Run statistics: per-work counters and the overall summary record

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Counters for one work within a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkStats {
    pub work: String,
    /// Pages discovered for this work
    pub pages_seen: usize,
    /// Pages that produced a validated analysis
    pub extracted: usize,
    /// Pages whose graph state was persisted
    pub saved: usize,
    /// Pages that ended in the failed state
    pub failed: usize,
    /// Pages where the assisted analyzer fell back to the heuristic
    pub fallbacks: usize,
    /// Segments skipped for unparseable ids
    pub skipped_segments: usize,
    /// Work-level error (segment fetch failed), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkStats {
    pub fn new(work: impl Into<String>) -> Self {
        Self {
            work: work.into(),
            ..Default::default()
        }
    }
}

/// Terminal output of a batch run, suitable for logging or JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub works_found: usize,
    pub works_processed: usize,
    pub pages_seen: usize,
    pub extracted: usize,
    pub saved: usize,
    pub failed: usize,
    pub fallbacks: usize,
    pub works: Vec<WorkStats>,
}

impl RunSummary {
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            works_found: 0,
            works_processed: 0,
            pages_seen: 0,
            extracted: 0,
            saved: 0,
            failed: 0,
            fallbacks: 0,
            works: Vec::new(),
        }
    }

    /// Fold one work's counters into the totals.
    pub(crate) fn absorb(&mut self, work: WorkStats) {
        self.pages_seen += work.pages_seen;
        self.extracted += work.extracted;
        self.saved += work.saved;
        self.failed += work.failed;
        self.fallbacks += work.fallbacks;
        if work.error.is_none() {
            self.works_processed += 1;
        }
        self.works.push(work);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

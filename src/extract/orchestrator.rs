//! Batch orchestration across pages and works
//!
//! Drives the full pipeline per page through a small state machine and
//! isolates every failure to the page that caused it: a batch run always
//! completes and returns a summary, even if every page failed.

use super::builder::GraphBuilder;
use super::stats::{RunSummary, WorkStats};
use super::ExtractError;
use crate::analysis::{validate, StructuralAnalyzer};
use crate::source::{group_pages, ContentNormalizer, PageGroup, SegmentStore};
use crate::storage::DiscourseStore;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// Which works a batch run covers.
#[derive(Debug, Clone)]
pub enum WorkSelector {
    /// Discover every work the segment store holds
    All,
    /// An explicit list of work names
    Named(Vec<String>),
}

/// Per-page processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Pending,
    Analyzing,
    Validating,
    Persisting,
    Done,
    Failed,
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of one page task, folded into the work counters.
struct PageOutcome {
    extracted: bool,
    saved: bool,
    fell_back: bool,
    error: Option<String>,
}

/// Wires capabilities into a [`BatchOrchestrator`].
///
/// The extraction mode is resolved here, once: callers hand in whichever
/// analyzer the deployment supports and the orchestrator never re-checks.
/// Missing capabilities are configuration errors, surfaced immediately.
pub struct ExtractorBuilder {
    segments: Option<Arc<dyn SegmentStore>>,
    analyzer: Option<Arc<dyn StructuralAnalyzer>>,
    store: Option<Arc<dyn DiscourseStore>>,
    normalizer: ContentNormalizer,
    page_concurrency: usize,
    analysis_timeout: Duration,
    persist_timeout: Duration,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    pub fn new() -> Self {
        Self {
            segments: None,
            analyzer: None,
            store: None,
            normalizer: ContentNormalizer::default(),
            page_concurrency: 4,
            analysis_timeout: Duration::from_secs(60),
            persist_timeout: Duration::from_secs(30),
        }
    }

    pub fn segments(mut self, segments: Arc<dyn SegmentStore>) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn StructuralAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn store(mut self, store: Arc<dyn DiscourseStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn normalizer(mut self, normalizer: ContentNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Maximum pages processed concurrently.
    pub fn page_concurrency(mut self, limit: usize) -> Self {
        self.page_concurrency = limit.max(1);
        self
    }

    /// Outer deadline for one page's analysis call.
    pub fn analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Deadline for one page's persistence call.
    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<BatchOrchestrator, ExtractError> {
        let segments = self
            .segments
            .ok_or_else(|| ExtractError::Config("no segment store wired".to_string()))?;
        let analyzer = self
            .analyzer
            .ok_or_else(|| ExtractError::Config("no analyzer wired".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| ExtractError::Config("no graph store wired".to_string()))?;

        Ok(BatchOrchestrator {
            segments,
            analyzer,
            builder: Arc::new(GraphBuilder::new(store)),
            normalizer: self.normalizer,
            page_gate: Arc::new(Semaphore::new(self.page_concurrency)),
            page_locks: Arc::new(DashMap::new()),
            analysis_timeout: self.analysis_timeout,
            persist_timeout: self.persist_timeout,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Drives extraction across many pages and many works.
#[derive(Clone)]
pub struct BatchOrchestrator {
    segments: Arc<dyn SegmentStore>,
    analyzer: Arc<dyn StructuralAnalyzer>,
    builder: Arc<GraphBuilder>,
    normalizer: ContentNormalizer,
    /// Bounds concurrent page tasks
    page_gate: Arc<Semaphore>,
    /// At-most-one concurrent writer per page_ref
    page_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    analysis_timeout: Duration,
    persist_timeout: Duration,
    cancelled: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    /// Stop spawning new page tasks. In-flight tasks run to a terminal
    /// state, so no page is ever left with a partial step set.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run extraction over the selected works.
    ///
    /// Page- and work-level failures are absorbed into the summary; the only
    /// errors this returns are configuration-grade (a segment store that
    /// cannot even enumerate works).
    pub async fn run(
        &self,
        selector: WorkSelector,
        start_page: Option<String>,
        limit_per_work: Option<usize>,
    ) -> Result<RunSummary, ExtractError> {
        let works = match selector {
            WorkSelector::Named(works) => works,
            WorkSelector::All => self.segments.list_works().await?,
        };

        let mut summary = RunSummary::begin();
        summary.works_found = works.len();
        tracing::info!(run_id = %summary.run_id, works = works.len(), "starting extraction run");

        for work in works {
            if self.is_cancelled() {
                tracing::info!(%work, "run cancelled, skipping remaining works");
                break;
            }
            let stats = self
                .run_work(&work, start_page.as_deref(), limit_per_work)
                .await;
            tracing::info!(
                work = %stats.work,
                pages = stats.pages_seen,
                saved = stats.saved,
                failed = stats.failed,
                "work complete"
            );
            summary.absorb(stats);
        }

        summary.finish();
        tracing::info!(
            run_id = %summary.run_id,
            saved = summary.saved,
            failed = summary.failed,
            fallbacks = summary.fallbacks,
            "extraction run complete"
        );
        Ok(summary)
    }

    /// Process one work: fetch, group, fan out page tasks.
    async fn run_work(
        &self,
        work: &str,
        start_page: Option<&str>,
        limit: Option<usize>,
    ) -> WorkStats {
        let mut stats = WorkStats::new(work);

        let segments = match self.segments.fetch_segments(work, start_page, None).await {
            Ok(segments) => segments,
            Err(e) => {
                tracing::warn!(%work, error = %e, "segment fetch failed");
                stats.error = Some(e.to_string());
                return stats;
            }
        };

        let (groups, skipped) = group_pages(&segments, start_page, limit);
        stats.pages_seen = groups.len();
        stats.skipped_segments = skipped;

        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();
        for group in groups {
            if self.is_cancelled() {
                break;
            }
            let this = self.clone();
            tasks.spawn(async move {
                let _permit = this.page_gate.acquire().await;
                this.process_page(group).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => PageOutcome {
                    extracted: false,
                    saved: false,
                    fell_back: false,
                    error: Some(format!("page task panicked: {}", e)),
                },
            };
            if outcome.extracted {
                stats.extracted += 1;
            }
            if outcome.saved {
                stats.saved += 1;
            }
            if outcome.fell_back {
                stats.fallbacks += 1;
            }
            if outcome.error.is_some() {
                stats.failed += 1;
            }
        }

        stats
    }

    /// One page through the state machine. Never propagates an error: the
    /// outcome records whether the page ended done or failed.
    async fn process_page(&self, group: PageGroup) -> PageOutcome {
        let page_ref = group.page_ref.clone();
        let mut state = PageState::Pending;
        tracing::debug!(%page_ref, state = %state, "page queued");

        let failed = |error: String, extracted: bool, fell_back: bool| {
            tracing::warn!(page_ref = %group.page_ref, state = %PageState::Failed, %error, "page failed");
            PageOutcome {
                extracted,
                saved: false,
                fell_back,
                error: Some(error),
            }
        };

        // Analyzing
        state = PageState::Analyzing;
        tracing::debug!(%page_ref, state = %state);
        let combined = self.normalizer.combine(&group.segments);
        let raw = match tokio::time::timeout(
            self.analysis_timeout,
            self.analyzer.analyze(&page_ref, &combined),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return failed(format!("analysis failed: {}", e), false, false),
            Err(_) => {
                return failed(
                    format!("analysis timed out after {:?}", self.analysis_timeout),
                    false,
                    false,
                )
            }
        };
        let fell_back = raw.fell_back;
        for warning in &raw.warnings {
            tracing::debug!(%page_ref, %warning, "analysis warning");
        }

        // Validating
        state = PageState::Validating;
        tracing::debug!(%page_ref, state = %state);
        let validated = validate(raw);
        if !validated.repairs.is_empty() {
            tracing::debug!(
                %page_ref,
                repairs = validated.repairs.len(),
                "validator repaired analyzer output"
            );
        }

        // Persisting — serialized per page_ref, bounded by a deadline.
        state = PageState::Persisting;
        tracing::debug!(%page_ref, state = %state);
        let lock = self
            .page_locks
            .entry(page_ref.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let builder = self.builder.clone();
        let segments = group.segments.clone();
        let persist = tokio::task::spawn_blocking(move || {
            builder.persist(&validated, &segments)
        });
        match tokio::time::timeout(self.persist_timeout, persist).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return failed(format!("persistence failed: {}", e), true, fell_back),
            Ok(Err(e)) => return failed(format!("persistence task failed: {}", e), true, fell_back),
            Err(_) => {
                return failed(
                    format!("persistence timed out after {:?}", self.persist_timeout),
                    true,
                    fell_back,
                )
            }
        }

        state = PageState::Done;
        tracing::debug!(%page_ref, state = %state, "page persisted");
        PageOutcome {
            extracted: true,
            saved: true,
            fell_back,
            error: None,
        }
    }
}

//! Shared fixtures for the extraction pipeline tests

use shakla::{
    AnalyzerConfig, BatchOrchestrator, DiscourseStore, HeuristicAnalyzer, InMemorySegmentStore,
    OpenStore, Segment, SqliteStore, StorageResult, StructuralAnalyzer,
};
use std::sync::Arc;

/// Three segments for work "W", page "1a" — the §8 scenario corpus.
pub fn one_page_corpus() -> Vec<Segment> {
    vec![
        Segment::new("W 1a:1", "W 1a", "<b>מאימתי קורין את שמע בערבין</b>")
            .with_secondary("From when may one recite the Shema in the evening?"),
        Segment::new("W 1a:2", "W 1a", "מאי שנא בערבין ברישא?"),
        Segment::new("W 1a:3", "W 1a", "אמר קרא ובשכבך ובקומך"),
    ]
}

/// Two works, one page each.
pub fn two_work_corpus() -> Vec<Segment> {
    vec![
        Segment::new("Berakhot 2a:1", "Berakhot 2a", "מאימתי קורין את שמע"),
        Segment::new("Berakhot 2a:2", "Berakhot 2a", "עד סוף האשמורה הראשונה"),
        Segment::new("Shabbat 2a:1", "Shabbat 2a", "יציאות השבת שתים"),
        Segment::new("Shabbat 2a:2", "Shabbat 2a", "שהן ארבע בפנים"),
    ]
}

/// A well-formed five-step completion document for "W 1a".
pub fn five_step_document() -> String {
    r#"{
        "title": "The evening Shema window",
        "summary": "The Gemara grounds the Mishnah's evening-first order in scripture.",
        "theme": "Liturgical obligation",
        "main_question": "Why does the Mishnah treat the evening recitation first?",
        "steps": [
            {"id": "1", "type": "teaching", "label": "Mishnah opens with the evening recitation", "speaker": "Mishnah", "content_preview": "מאימתי קורין את שמע בערבין", "parent_id": null},
            {"id": "2", "type": "question", "label": "Why evening before morning?", "speaker": "Gemara", "content_preview": "מאי שנא בערבין ברישא", "parent_id": "1"},
            {"id": "3", "type": "resolution", "label": "Scripture lists lying down first", "speaker": "Gemara", "content_preview": "אמר קרא ובשכבך ובקומך", "parent_id": "2"},
            {"id": "4", "type": "proof", "label": "Supporting verse cited", "speaker": "Gemara", "content_preview": "", "parent_id": "3"},
            {"id": "5", "type": "conclusion", "label": "The order follows the verse", "speaker": "Gemara", "content_preview": "", "parent_id": "4"}
        ]
    }"#
    .to_string()
}

/// A well-formed two-step completion document for "W 1a".
pub fn two_step_document() -> String {
    r#"{
        "title": "The evening Shema window",
        "summary": "Condensed re-analysis.",
        "theme": "Liturgical obligation",
        "main_question": "Why evening first?",
        "steps": [
            {"id": "1", "type": "teaching", "label": "Mishnah opens", "speaker": "Mishnah", "content_preview": "", "parent_id": null},
            {"id": "2", "type": "question", "label": "Why evening first?", "speaker": "Gemara", "content_preview": "", "parent_id": "1"}
        ]
    }"#
    .to_string()
}

/// Orchestrator over the given corpus and analyzer, backed by `store`.
pub fn orchestrator(
    corpus: Vec<Segment>,
    analyzer: Arc<dyn StructuralAnalyzer>,
    store: Arc<dyn DiscourseStore>,
) -> BatchOrchestrator {
    BatchOrchestrator::builder()
        .segments(Arc::new(InMemorySegmentStore::new(corpus)))
        .analyzer(analyzer)
        .store(store)
        .build()
        .expect("all capabilities wired")
}

/// Heuristic-only orchestrator — the "no completion capability" wiring.
pub fn heuristic_orchestrator(
    corpus: Vec<Segment>,
    store: Arc<dyn DiscourseStore>,
) -> BatchOrchestrator {
    orchestrator(
        corpus,
        Arc::new(HeuristicAnalyzer::new(AnalyzerConfig::default())),
        store,
    )
}

pub fn in_memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().expect("in-memory store opens"))
}

/// Store wrapper that rejects writes for one page, for failure-isolation tests.
pub struct FailingStore<S: DiscourseStore> {
    pub inner: S,
    pub fail_page: String,
}

impl<S: DiscourseStore> DiscourseStore for FailingStore<S> {
    fn upsert_unit(&self, unit: &shakla::DiscourseUnit) -> StorageResult<()> {
        if unit.page_ref == self.fail_page {
            return Err(shakla::StorageError::DateParse(
                "injected write failure".to_string(),
            ));
        }
        self.inner.upsert_unit(unit)
    }

    fn unit(&self, page_ref: &str) -> StorageResult<Option<shakla::DiscourseUnit>> {
        self.inner.unit(page_ref)
    }

    fn list_units(&self) -> StorageResult<Vec<shakla::DiscourseUnit>> {
        self.inner.list_units()
    }

    fn delete_unit(&self, page_ref: &str) -> StorageResult<bool> {
        self.inner.delete_unit(page_ref)
    }

    fn replace_steps(
        &self,
        page_ref: &str,
        steps: &[shakla::StepNode],
        edges: &[shakla::GraphEdge],
    ) -> StorageResult<()> {
        self.inner.replace_steps(page_ref, steps, edges)
    }

    fn steps_for_page(&self, page_ref: &str) -> StorageResult<Vec<shakla::StepNode>> {
        self.inner.steps_for_page(page_ref)
    }

    fn edges_for_page(&self, page_ref: &str) -> StorageResult<Vec<shakla::GraphEdge>> {
        self.inner.edges_for_page(page_ref)
    }
}

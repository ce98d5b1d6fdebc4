//! Completion-assisted structural analysis
//!
//! Delegates to the external text-completion capability with a fixed
//! instruction template, then parses the structured response. Every failure
//! mode — service unavailable, transport error, timeout, unparseable output —
//! degrades to the heuristic result for the same page and records the
//! fallback; nothing here ever raises to the caller.

use super::heuristic::HeuristicAnalyzer;
use super::traits::StructuralAnalyzer;
use super::types::{AnalysisError, AnalyzerConfig, RawAnalysis, RawStep};
use crate::completion::CompletionClient;
use crate::graph::ExtractionStrategy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Analyzer backed by an external text-completion capability.
///
/// Completion calls run behind a bounded-concurrency semaphore (the service
/// is the scarce, cost-bearing resource) and under a timeout.
pub struct AssistedAnalyzer {
    client: Arc<dyn CompletionClient>,
    fallback: HeuristicAnalyzer,
    config: AnalyzerConfig,
    gate: Arc<Semaphore>,
}

impl AssistedAnalyzer {
    pub fn new(client: Arc<dyn CompletionClient>, config: AnalyzerConfig) -> Self {
        let gate = Arc::new(Semaphore::new(config.completion_concurrency.max(1)));
        Self {
            client,
            fallback: HeuristicAnalyzer::new(config.clone()),
            config,
            gate,
        }
    }

    /// Fixed instruction template for one page.
    fn build_prompt(&self, page_ref: &str, text: &str) -> String {
        let (lo, hi) = self.config.target_steps;
        format!(
            r#"Analyze this dialectic passage from {page_ref} and extract ALL argumentation steps.

TEXT:
{text}

Provide a COMPLETE analysis with:
1. A concise title (5-10 words) that captures the main topic
2. A one-sentence summary
3. The main theme
4. The main question being discussed
5. The COMPLETE argumentation structure - every question, challenge,
   resolution, dispute, proof, refutation, and conclusion, including all
   intermediate steps

For each step provide:
- id: sequential number (1, 2, 3, ...)
- type: one of "teaching", "question", "challenge", "resolution", "dispute",
  "proof", "refutation", "conclusion", "unresolved"
- label: clear description of this step (50-100 characters)
- speaker: who is speaking (Mishnah, Gemara, a named sage if mentioned)
- content_preview: first 30-50 words quoted from the actual text
- parent_id: id of the step this one responds to (null for the first step)

IMPORTANT: extract as many distinguishable steps as the source supports -
aim for {lo}-{hi}+ steps to capture the complete flow.

Format your response as JSON:
{{
    "title": "...",
    "summary": "...",
    "theme": "...",
    "main_question": "...",
    "steps": [
        {{
            "id": "1",
            "type": "teaching",
            "label": "Initial teaching",
            "speaker": "Mishnah",
            "content_preview": "...",
            "parent_id": null
        }}
    ]
}}"#
        )
    }

    /// Run the completion call under the concurrency gate and timeout, then
    /// parse the document. Errors here are caught by `analyze` and turned
    /// into a heuristic fallback.
    async fn request_analysis(
        &self,
        page_ref: &str,
        text: &str,
    ) -> Result<RawAnalysis, AnalysisError> {
        let prompt = self.build_prompt(page_ref, text);

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AnalysisError::CompletionFailed(e.to_string()))?;

        let deadline = Duration::from_secs(self.config.completion_timeout_secs);
        let response = tokio::time::timeout(deadline, self.client.complete(&prompt))
            .await
            .map_err(|_| AnalysisError::Timeout(self.config.completion_timeout_secs))?
            .map_err(|e| AnalysisError::CompletionFailed(e.to_string()))?;

        parse_analysis_document(page_ref, &response)
    }
}

#[async_trait]
impl StructuralAnalyzer for AssistedAnalyzer {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Assisted
    }

    async fn analyze(&self, page_ref: &str, text: &str) -> Result<RawAnalysis, AnalysisError> {
        if !self.client.is_available().await {
            tracing::warn!(page_ref, "completion service unavailable, using heuristic");
            return self.heuristic_fallback(page_ref, text, "completion service unavailable").await;
        }

        match self.request_analysis(page_ref, text).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(page_ref, error = %e, "assisted analysis failed, using heuristic");
                self.heuristic_fallback(page_ref, text, e.to_string()).await
            }
        }
    }
}

impl AssistedAnalyzer {
    async fn heuristic_fallback(
        &self,
        page_ref: &str,
        text: &str,
        reason: impl Into<String>,
    ) -> Result<RawAnalysis, AnalysisError> {
        let mut result = self.fallback.analyze(page_ref, text).await?;
        result.fell_back = true;
        result.add_warning(format!("fell back to heuristic analysis: {}", reason.into()));
        Ok(result)
    }
}

/// Extract a JSON object from completion response text.
///
/// Completions sometimes wrap JSON in markdown code fences or add
/// explanation text. Tries, in order: direct parse, fenced block,
/// first-`{`-to-last-`}` span.
fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();

    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if v.is_object() {
            return Some(v);
        }
    }

    let fenced = if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        after.find("```").map(|end| &after[..end])
    } else if let Some(start) = trimmed.find("```\n") {
        let after = &trimmed[start + 4..];
        after.find("```").map(|end| &after[..end])
    } else {
        None
    };

    if let Some(block) = fenced {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(block.trim()) {
            if v.is_object() {
                return Some(v);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(&trimmed[start..=end]) {
                if v.is_object() {
                    return Some(v);
                }
            }
        }
    }

    None
}

/// Parse a completion response into a raw analysis.
///
/// Accepts `steps` (canonical) or `dialectic_nodes` (legacy field name) for
/// the step array, and `parent_id` or `parent` for the parent reference. A
/// missing or empty step array is malformed: there is nothing to persist and
/// the heuristic result is strictly better.
fn parse_analysis_document(page_ref: &str, response: &str) -> Result<RawAnalysis, AnalysisError> {
    let doc = extract_json(response).ok_or_else(|| {
        let head: String = response.chars().take(200).collect();
        AnalysisError::Malformed(format!("no JSON object in response: {}", head))
    })?;

    let mut result = RawAnalysis::new(page_ref, ExtractionStrategy::Assisted);
    result.title = text_field(&doc, "title")
        .unwrap_or_else(|| format!("Discussion on {}", page_ref));
    result.summary = text_field(&doc, "summary").unwrap_or_default();
    result.theme = text_field(&doc, "theme").unwrap_or_default();
    result.main_question = text_field(&doc, "main_question").unwrap_or_default();

    let steps = doc
        .get("steps")
        .or_else(|| doc.get("dialectic_nodes"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::Malformed("missing steps array".to_string()))?;

    for step in steps {
        result.steps.push(RawStep {
            raw_id: step_field(step, "id"),
            step_type: step_field(step, "type").unwrap_or_default(),
            label: step_field(step, "label").unwrap_or_default(),
            speaker: step_field(step, "speaker"),
            content_preview: step_field(step, "content_preview"),
            parent: step_field(step, "parent_id").or_else(|| step_field(step, "parent")),
        });
    }

    if result.steps.is_empty() {
        return Err(AnalysisError::Malformed("empty steps array".to_string()));
    }

    Ok(result)
}

fn text_field(doc: &serde_json::Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Step fields may arrive as strings or bare numbers; normalize to String.
fn step_field(step: &serde_json::Value, key: &str) -> Option<String> {
    match step.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{HangingCompletion, MockCompletion};

    const WELL_FORMED: &str = r#"{
        "title": "The time of the evening Shema",
        "summary": "The Gemara fixes the earliest time for the evening recitation.",
        "theme": "Liturgical obligation",
        "main_question": "From when may one recite the Shema in the evening?",
        "steps": [
            {"id": "1", "type": "teaching", "label": "Mishnah sets the window", "speaker": "Mishnah", "content_preview": "From when...", "parent_id": null},
            {"id": "2", "type": "question", "label": "Why evening first?", "speaker": "Gemara", "content_preview": "...", "parent_id": "1"},
            {"id": "3", "type": "resolution", "label": "Scripture orders lying down first", "speaker": "Gemara", "content_preview": "...", "parent_id": "2"}
        ]
    }"#;

    fn analyzer(client: MockCompletion) -> AssistedAnalyzer {
        AssistedAnalyzer::new(Arc::new(client), AnalyzerConfig::default())
    }

    #[tokio::test]
    async fn well_formed_response_parses_as_assisted() {
        let analyzer = analyzer(MockCompletion::available().with_response(WELL_FORMED));
        let result = analyzer.analyze("Berakhot 2a", "text").await.unwrap();
        assert_eq!(result.strategy, ExtractionStrategy::Assisted);
        assert!(!result.fell_back);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.title, "The time of the evening Shema");
        assert_eq!(result.steps[1].parent.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn fenced_response_is_recovered() {
        let fenced = format!("Here is the analysis:\n```json\n{}\n```", WELL_FORMED);
        let analyzer = analyzer(MockCompletion::available().with_response(fenced));
        let result = analyzer.analyze("Berakhot 2a", "text").await.unwrap();
        assert!(!result.fell_back);
        assert_eq!(result.steps.len(), 3);
    }

    #[tokio::test]
    async fn unavailable_service_falls_back_to_heuristic() {
        let analyzer = analyzer(MockCompletion::unavailable());
        let result = analyzer.analyze("W 1a", "שורה ראשונה\nשורה שניה").await.unwrap();
        assert_eq!(result.strategy, ExtractionStrategy::Heuristic);
        assert!(result.fell_back);
        assert!(!result.warnings.is_empty());
    }

    #[tokio::test]
    async fn unparsable_response_falls_back_to_heuristic() {
        let analyzer = analyzer(
            MockCompletion::available().with_response("I could not analyze this passage."),
        );
        let result = analyzer.analyze("W 1a", "שורה ראשונה\nשורה שניה").await.unwrap();
        assert!(result.fell_back);
        assert_eq!(result.strategy, ExtractionStrategy::Heuristic);
    }

    #[tokio::test]
    async fn empty_steps_array_is_malformed_and_falls_back() {
        let analyzer = analyzer(
            MockCompletion::available()
                .with_response(r#"{"title": "t", "summary": "s", "steps": []}"#),
        );
        let result = analyzer.analyze("W 1a", "שורה").await.unwrap();
        assert!(result.fell_back);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_completion_times_out_and_falls_back() {
        let analyzer =
            AssistedAnalyzer::new(Arc::new(HangingCompletion), AnalyzerConfig::default());
        let result = analyzer.analyze("W 1a", "שורה אחת ויחידה").await.unwrap();
        assert!(result.fell_back);
        assert!(result.warnings.iter().any(|w| w.contains("timed out")));
    }

    #[tokio::test]
    async fn legacy_field_names_are_accepted() {
        let legacy = r#"{
            "title": "t",
            "dialectic_nodes": [
                {"id": 1, "type": "mishnah", "label": "opening", "parent": null},
                {"id": 2, "type": "kasha", "label": "objection", "parent": 1}
            ]
        }"#;
        let analyzer = analyzer(MockCompletion::available().with_response(legacy));
        let result = analyzer.analyze("W 1a", "text").await.unwrap();
        assert!(!result.fell_back);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[1].parent.as_deref(), Some("1"));
    }

    #[test]
    fn extract_json_finds_embedded_object() {
        let v = extract_json("noise before {\"a\": 1} noise after").unwrap();
        assert_eq!(v["a"], 1);
        assert!(extract_json("no json here").is_none());
    }
}

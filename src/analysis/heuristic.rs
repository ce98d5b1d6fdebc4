//! Deterministic structural analysis via lexical cues
//!
//! Scans the combined page text clause by clause and classifies each clause
//! into a step type using fixed keyword cues from the source language:
//! interrogative particles mark questions, contrastive connectives mark
//! challenges, citation formulae mark proofs. No external dependency, no
//! nondeterminism: the same input always yields the same result.

use super::traits::StructuralAnalyzer;
use super::types::{AnalysisError, AnalyzerConfig, RawAnalysis, RawStep};
use crate::graph::{ExtractionStrategy, StepType};
use async_trait::async_trait;

/// Interrogative particles: why / what / whence / how.
const QUESTION_CUES: [&str; 4] = ["למה", "מאי", "מנא", "היכי"];

/// Contrastive/objection connectives introducing a difficulty.
const CHALLENGE_CUES: [&str; 4] = ["מיתיבי", "והא", "איני", "קשיא"];

/// Markers that a challenge is being answered.
const RESOLUTION_CUES: [&str; 3] = ["אלא", "לא קשיא", "תרצה"];

/// Citation formulae introducing scriptural or tannaitic evidence.
const PROOF_CUES: [&str; 3] = ["שנאמר", "דכתיב", "תא שמע"];

/// Markers of a named disagreement.
const DISPUTE_CUES: [&str; 2] = ["פלוגתא", "מחלוקת"];

/// Quotation/teaching markers.
const TEACHING_CUES: [&str; 3] = ["אמר", "תנן", "תניא"];

const LABEL_CHARS: usize = 80;
const PREVIEW_CHARS: usize = 100;

/// Deterministic keyword/position driven analyzer.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    config: AnalyzerConfig,
}

impl HeuristicAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Split combined text into clauses, bounded by `max_steps`.
    ///
    /// Lines are the primary unit (the normalizer separates segments with
    /// blank lines). When that yields fewer clauses than the guaranteed
    /// minimum, lines are further split on sentence boundaries.
    fn split_clauses(&self, text: &str) -> Vec<String> {
        let mut clauses: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if clauses.len() < self.config.min_steps {
            clauses = clauses
                .iter()
                .flat_map(|line| {
                    line.split_inclusive(['.', '?', '!'])
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect();
        }

        clauses.truncate(self.config.max_steps);
        clauses
    }

    fn classify(clause: &str, index: usize) -> StepType {
        if index == 0 {
            return StepType::Teaching;
        }
        if contains_any(clause, &DISPUTE_CUES) {
            return StepType::Dispute;
        }
        // Resolution before challenge: "לא קשיא" embeds the challenge cue.
        if contains_any(clause, &RESOLUTION_CUES) {
            return StepType::Resolution;
        }
        if contains_any(clause, &CHALLENGE_CUES) {
            return StepType::Challenge;
        }
        if contains_any(clause, &PROOF_CUES) {
            return StepType::Proof;
        }
        if clause.contains('?') || contains_any(clause, &QUESTION_CUES) {
            return StepType::Question;
        }
        if contains_any(clause, &TEACHING_CUES) {
            return StepType::Teaching;
        }
        StepType::Statement
    }

    /// Parent assignment: linear chain by default; a challenge attaches to
    /// the step it contests (nearest preceding non-challenge), a resolution
    /// to the challenge it answers.
    fn assign_parent(types: &[StepType], index: usize) -> Option<usize> {
        if index == 0 {
            return None;
        }
        match types[index] {
            StepType::Challenge => (0..index).rev().find(|&i| types[i] != StepType::Challenge),
            StepType::Resolution => (0..index)
                .rev()
                .find(|&i| types[i] == StepType::Challenge)
                .or(Some(index - 1)),
            _ => Some(index - 1),
        }
        .or(Some(index - 1))
    }

    /// Generic tail appended when the input yields too few clauses, so the
    /// minimum-step guarantee holds on any non-empty page.
    fn padding_step(position: usize, parent: usize) -> RawStep {
        let (step_type, label) = match position % 4 {
            0 => (StepType::Challenge, "Challenge to the preceding statement"),
            1 => (StepType::Resolution, "Resolution of the challenge"),
            2 => (StepType::Proof, "Supporting proof from another source"),
            _ => (StepType::Conclusion, "Concluding ruling"),
        };
        RawStep {
            raw_id: None,
            step_type: step_type.as_str().to_string(),
            label: label.to_string(),
            speaker: Some("Gemara".to_string()),
            content_preview: None,
            parent: Some(parent.to_string()),
        }
    }
}

fn contains_any(clause: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| clause.contains(cue))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[async_trait]
impl StructuralAnalyzer for HeuristicAnalyzer {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Heuristic
    }

    async fn analyze(&self, page_ref: &str, text: &str) -> Result<RawAnalysis, AnalysisError> {
        let clauses = self.split_clauses(text);

        let types: Vec<StepType> = clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| Self::classify(clause, i))
            .collect();

        let mut result = RawAnalysis::new(page_ref, ExtractionStrategy::Heuristic);
        result.title = format!("Discussion on {}", page_ref);
        result.summary = format!("Dialectic discussion from {}", page_ref);
        result.theme = "Halakhic discourse".to_string();
        result.main_question = clauses
            .first()
            .map(|c| truncate(c, PREVIEW_CHARS))
            .unwrap_or_else(|| "Discussion topic".to_string());

        for (i, clause) in clauses.iter().enumerate() {
            let speaker = if i == 0 { "Mishnah" } else { "Gemara" };
            result.steps.push(RawStep {
                raw_id: Some((i + 1).to_string()),
                step_type: types[i].as_str().to_string(),
                label: truncate(clause, LABEL_CHARS),
                speaker: Some(speaker.to_string()),
                content_preview: Some(truncate(clause, PREVIEW_CHARS)),
                parent: Self::assign_parent(&types, i).map(|p| (p + 1).to_string()),
            });
        }

        // Pad to the guaranteed minimum.
        let pad_start = result.steps.len();
        while result.steps.len() < self.config.min_steps {
            let position = result.steps.len();
            let mut step = Self::padding_step(position - pad_start, position);
            step.raw_id = Some((position + 1).to_string());
            if position == 0 {
                step.parent = None;
            }
            result.steps.push(step);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> HeuristicAnalyzer {
        HeuristicAnalyzer::default()
    }

    #[tokio::test]
    async fn first_clause_is_a_teaching() {
        let result = analyzer()
            .analyze("Berakhot 2a", "מאימתי קורין את שמע בערבין\nעד סוף האשמורה הראשונה")
            .await
            .unwrap();
        assert_eq!(result.steps[0].step_type, "teaching");
        assert_eq!(result.steps[0].speaker.as_deref(), Some("Mishnah"));
        assert!(result.steps[0].parent.is_none());
    }

    #[tokio::test]
    async fn interrogatives_classify_as_questions() {
        let result = analyzer()
            .analyze("W 1a", "תנא פתח\nמאי טעמא דרבנן\nומנא לן דחובה")
            .await
            .unwrap();
        assert_eq!(result.steps[1].step_type, "question");
        assert_eq!(result.steps[2].step_type, "question");
    }

    #[tokio::test]
    async fn contrastives_classify_as_challenges_and_attach_to_contested_step() {
        let result = analyzer()
            .analyze("W 1a", "אמר רב הלכה כך\nוהא תניא איפכא\nאלא לא קשיא")
            .await
            .unwrap();
        assert_eq!(result.steps[1].step_type, "challenge");
        // Challenge contests the teaching at raw id 1.
        assert_eq!(result.steps[1].parent.as_deref(), Some("1"));
        // Resolution answers the challenge at raw id 2.
        assert_eq!(result.steps[2].step_type, "resolution");
        assert_eq!(result.steps[2].parent.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn citation_markers_classify_as_proof() {
        let result = analyzer()
            .analyze("W 1a", "פתיחה\nשנאמר ובשכבך ובקומך")
            .await
            .unwrap();
        assert_eq!(result.steps[1].step_type, "proof");
    }

    #[tokio::test]
    async fn minimum_step_guarantee_holds_on_tiny_input() {
        let result = analyzer().analyze("W 1a", "שורה אחת").await.unwrap();
        assert!(result.steps.len() >= 2);
        // Padding steps chain onto the real first step.
        assert_eq!(result.steps[1].parent.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn scanning_is_bounded_by_max_steps() {
        let text: String = (0..50)
            .map(|i| format!("שורה מספר {}\n", i))
            .collect();
        let result = analyzer().analyze("W 1a", &text).await.unwrap();
        assert_eq!(result.steps.len(), AnalyzerConfig::default().max_steps);
    }

    #[tokio::test]
    async fn analysis_is_deterministic() {
        let text = "אמר רב\nמאי טעמא?\nוהא תניא\nאלא הכי קאמר";
        let a = analyzer().analyze("W 1a", text).await.unwrap();
        let b = analyzer().analyze("W 1a", text).await.unwrap();
        let types_a: Vec<_> = a.steps.iter().map(|s| s.step_type.clone()).collect();
        let types_b: Vec<_> = b.steps.iter().map(|s| s.step_type.clone()).collect();
        assert_eq!(types_a, types_b);
        assert_eq!(a.title, b.title);
        assert_eq!(a.main_question, b.main_question);
    }
}

//! Response validation: canonicalize raw analyzer output
//!
//! The primary defense against analyzer nondeterminism. Pure — no I/O.
//! Whatever either analyzer emits, the output here satisfies the storage
//! invariants: contiguous 1-based sequences, parents strictly preceding
//! their children, every type inside the closed enumeration.

use super::types::{RawAnalysis, RawStep};
use crate::graph::{ExtractionStrategy, StepNode, StepType};
use std::collections::HashMap;

/// A canonical analysis result, safe to persist.
#[derive(Debug, Clone)]
pub struct ValidatedAnalysis {
    pub page_ref: String,
    pub title: String,
    pub summary: String,
    pub theme: String,
    pub main_question: String,
    pub strategy: ExtractionStrategy,
    pub fell_back: bool,
    /// Steps addressed by sequence: `steps[i].sequence == i + 1`
    pub steps: Vec<StepNode>,
    /// Best-effort corrections applied to the raw output. Data, not errors.
    pub repairs: Vec<String>,
}

/// Canonicalize a raw analysis.
///
/// Steps with empty labels are dropped and the numbering closes around the
/// gap; unknown types coerce to `statement`; missing, forward, or
/// self-referencing parents are rewritten to the nearest valid preceding
/// sequence (none for the first step).
pub fn validate(raw: RawAnalysis) -> ValidatedAnalysis {
    let mut repairs = Vec::new();

    // Pass 1: keep steps with a usable label, remembering each kept step's
    // original position so raw ids resolve after renumbering.
    let mut kept: Vec<(usize, RawStep)> = Vec::new();
    for (original_pos, step) in raw.steps.into_iter().enumerate() {
        if step.label.trim().is_empty() {
            repairs.push(format!(
                "dropped step at position {} with empty label",
                original_pos + 1
            ));
            continue;
        }
        kept.push((original_pos, step));
    }

    // Raw id (or original 1-based position) → new contiguous sequence.
    // Raw ids win over positional keys when the two spaces collide.
    let mut id_to_sequence: HashMap<String, u32> = HashMap::new();
    for (new_pos, (original_pos, _)) in kept.iter().enumerate() {
        id_to_sequence.insert((original_pos + 1).to_string(), (new_pos + 1) as u32);
    }
    for (new_pos, (_, step)) in kept.iter().enumerate() {
        if let Some(raw_id) = &step.raw_id {
            id_to_sequence.insert(raw_id.trim().to_string(), (new_pos + 1) as u32);
        }
    }

    // Pass 2: build canonical steps.
    let mut steps = Vec::with_capacity(kept.len());
    for (new_pos, (_, step)) in kept.into_iter().enumerate() {
        let sequence = (new_pos + 1) as u32;

        let step_type = StepType::from_raw(&step.step_type);
        if step_type == StepType::Statement && step.step_type.trim().to_lowercase() != "statement" {
            repairs.push(format!(
                "step {}: unrecognized type {:?} coerced to statement",
                sequence, step.step_type
            ));
        }

        let parent_sequence = resolve_parent(
            sequence,
            step.parent.as_deref(),
            &id_to_sequence,
            &mut repairs,
        );

        steps.push(StepNode {
            page_ref: raw.page_ref.clone(),
            sequence,
            step_type,
            label: step.label.trim().to_string(),
            speaker: step.speaker.filter(|s| !s.trim().is_empty()),
            content_preview: step.content_preview.filter(|s| !s.trim().is_empty()),
            parent_sequence,
        });
    }

    ValidatedAnalysis {
        page_ref: raw.page_ref,
        title: raw.title,
        summary: raw.summary,
        theme: raw.theme,
        main_question: raw.main_question,
        strategy: raw.strategy,
        fell_back: raw.fell_back,
        steps,
        repairs,
    }
}

/// Resolve a raw parent reference against the renumbered id space.
///
/// Any reference that is missing, dangling, forward, or self-referencing
/// becomes the nearest valid preceding sequence — `sequence - 1`, or None
/// for the first step.
fn resolve_parent(
    sequence: u32,
    raw_parent: Option<&str>,
    id_to_sequence: &HashMap<String, u32>,
    repairs: &mut Vec<String>,
) -> Option<u32> {
    let nearest_preceding = if sequence > 1 { Some(sequence - 1) } else { None };

    let raw = match raw_parent {
        Some(r) if !r.trim().is_empty() && r.trim() != "null" => r.trim(),
        _ => {
            if sequence > 1 {
                repairs.push(format!(
                    "step {}: missing parent rewritten to {}",
                    sequence,
                    sequence - 1
                ));
            }
            return nearest_preceding;
        }
    };

    match id_to_sequence.get(raw) {
        Some(&target) if target < sequence => Some(target),
        Some(&target) => {
            repairs.push(format!(
                "step {}: parent reference {:?} points at sequence {} (not preceding), rewritten",
                sequence, raw, target
            ));
            nearest_preceding
        }
        None => {
            repairs.push(format!(
                "step {}: dangling parent reference {:?} rewritten",
                sequence, raw
            ));
            nearest_preceding
        }
    }
}

//! Content normalization: markup stripping, concatenation, truncation

use super::segment::Segment;

/// Default analysis budget in characters.
///
/// Bounds downstream analysis cost; truncation is lossy and silent.
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// Flattens one page's segments into a single analysis string.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    max_chars: usize,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl ContentNormalizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Combine a page's segments: strip markup from each text field,
    /// concatenate primary (and secondary, when present) in order, and
    /// truncate to the character budget.
    pub fn combine(&self, segments: &[Segment]) -> String {
        let mut parts = Vec::new();
        for seg in segments {
            let primary = strip_tags(&seg.primary_text);
            if !primary.trim().is_empty() {
                parts.push(primary.trim().to_string());
            }
            if let Some(secondary) = &seg.secondary_text {
                let secondary = strip_tags(secondary);
                if !secondary.trim().is_empty() {
                    parts.push(secondary.trim().to_string());
                }
            }
        }
        truncate_chars(&parts.join("\n\n"), self.max_chars)
    }
}

/// Remove angle-bracket markup tags, keeping the text between them.
///
/// The source corpus embeds presentation tags (`<b>`, `<i>`, `<big>`, ...);
/// an unclosed `<` runs to end of input and is dropped.
pub(crate) fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Truncate to at most `max_chars` characters on a char boundary, appending
/// an ellipsis marker when anything was cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

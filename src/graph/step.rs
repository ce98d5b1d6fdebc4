//! StepNode: one typed step in a page's argumentation sequence

use serde::{Deserialize, Serialize};

/// Closed enumeration of argumentation step types.
///
/// Analyzer output arrives as free strings (often the classical dialectic
/// vocabulary of the source material); [`StepType::from_raw`] maps those onto
/// this enumeration. Anything unrecognized becomes [`StepType::Statement`] —
/// steps are never dropped for having an unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Initial assertion or received tradition
    Teaching,
    Question,
    /// A difficulty raised against a prior step
    Challenge,
    /// Answers a challenge
    Resolution,
    /// Two or more positions in direct conflict
    Dispute,
    /// Supporting evidence cited
    Proof,
    /// Rejects a prior proof or claim
    Refutation,
    /// Final ruling or synthesis
    Conclusion,
    /// Explicitly left open
    Unresolved,
    /// Generic fallback for unrecognized types
    Statement,
}

impl StepType {
    /// Map a raw analyzer-emitted type string into the closed enumeration.
    ///
    /// Accepts both the canonical names and the dialectic vocabulary the
    /// source material uses (kasha, terutz, mishnah, teiku, ...).
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "teaching" | "mishnah" | "braita" | "baraita" => Self::Teaching,
            "question" | "sheela" => Self::Question,
            "challenge" | "kasha" | "kushya" | "teyuvta" => Self::Challenge,
            "resolution" | "answer" | "terutz" | "teshuvah" | "peshat" => Self::Resolution,
            "dispute" | "machloket" | "pluga" => Self::Dispute,
            "proof" | "raya" => Self::Proof,
            "refutation" => Self::Refutation,
            "conclusion" | "psak" => Self::Conclusion,
            "unresolved" | "teiku" => Self::Unresolved,
            _ => Self::Statement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teaching => "teaching",
            Self::Question => "question",
            Self::Challenge => "challenge",
            Self::Resolution => "resolution",
            Self::Dispute => "dispute",
            Self::Proof => "proof",
            Self::Refutation => "refutation",
            Self::Conclusion => "conclusion",
            Self::Unresolved => "unresolved",
            Self::Statement => "statement",
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One argumentation step within a page's discourse unit.
///
/// `sequence` is 1-based and contiguous within a page; `parent_sequence`, if
/// present, always refers to a strictly smaller sequence in the same page.
/// Both invariants are enforced by the response validator before any step
/// reaches storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    /// Page this step belongs to, e.g. "Berakhot 2a"
    pub page_ref: String,
    /// 1-based position within the page
    pub sequence: u32,
    pub step_type: StepType,
    /// Short description of this step
    pub label: String,
    /// Optional attribution (named sage, "Gemara", ...)
    pub speaker: Option<String>,
    /// Optional quoted excerpt from the source text
    pub content_preview: Option<String>,
    /// The step this one responds to; None for an opening step
    pub parent_sequence: Option<u32>,
}

impl StepNode {
    /// Composite stable id: `"<page_ref>#<sequence>"`.
    pub fn id(&self) -> String {
        step_id(&self.page_ref, self.sequence)
    }
}

/// Build the composite step id for a page and sequence.
pub(crate) fn step_id(page_ref: &str, sequence: u32) -> String {
    format!("{}#{}", page_ref, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_map_to_themselves() {
        for (raw, expected) in [
            ("teaching", StepType::Teaching),
            ("question", StepType::Question),
            ("challenge", StepType::Challenge),
            ("resolution", StepType::Resolution),
            ("dispute", StepType::Dispute),
            ("proof", StepType::Proof),
            ("refutation", StepType::Refutation),
            ("conclusion", StepType::Conclusion),
            ("unresolved", StepType::Unresolved),
        ] {
            assert_eq!(StepType::from_raw(raw), expected);
            assert_eq!(expected.as_str(), raw);
        }
    }

    #[test]
    fn dialectic_vocabulary_maps_into_closed_enum() {
        assert_eq!(StepType::from_raw("kasha"), StepType::Challenge);
        assert_eq!(StepType::from_raw("Kushya"), StepType::Challenge);
        assert_eq!(StepType::from_raw("terutz"), StepType::Resolution);
        assert_eq!(StepType::from_raw("mishnah"), StepType::Teaching);
        assert_eq!(StepType::from_raw("braita"), StepType::Teaching);
        assert_eq!(StepType::from_raw("teiku"), StepType::Unresolved);
        assert_eq!(StepType::from_raw("machloket"), StepType::Dispute);
    }

    #[test]
    fn unknown_types_fall_back_to_statement() {
        assert_eq!(StepType::from_raw(""), StepType::Statement);
        assert_eq!(StepType::from_raw("interjection"), StepType::Statement);
        assert_eq!(StepType::from_raw("  gemara  "), StepType::Statement);
    }

    #[test]
    fn step_id_is_page_ref_plus_sequence() {
        let step = StepNode {
            page_ref: "Berakhot 2a".to_string(),
            sequence: 3,
            step_type: StepType::Question,
            label: "Why evening first?".to_string(),
            speaker: None,
            content_preview: None,
            parent_sequence: Some(2),
        };
        assert_eq!(step.id(), "Berakhot 2a#3");
    }
}

//! DiscourseUnit: the root summary record for one page's argument

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which analysis strategy produced a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Deterministic keyword/position driven analysis
    Heuristic,
    /// Delegated to an external text-completion capability
    Assisted,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Assisted => "assisted",
        }
    }

    /// Parse a stored strategy string. Unknown values read back as heuristic,
    /// the conservative default.
    pub fn parse(s: &str) -> Self {
        match s {
            "assisted" => Self::Assisted,
            _ => Self::Heuristic,
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page's complete argument, summarized.
///
/// `page_ref` is the natural key: at most one unit exists per page, and
/// re-extraction updates it in place. `created_at` is set on first creation
/// and preserved across updates; `updated_at` is refreshed on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscourseUnit {
    /// Natural key, e.g. "Berakhot 2a"
    pub page_ref: String,
    pub title: String,
    pub summary: String,
    pub theme: String,
    pub main_question: String,
    pub strategy: ExtractionStrategy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscourseUnit {
    /// Create a fresh unit with both timestamps set to now.
    pub fn new(page_ref: impl Into<String>, strategy: ExtractionStrategy) -> Self {
        let now = Utc::now();
        Self {
            page_ref: page_ref.into(),
            title: String::new(),
            summary: String::new(),
            theme: String::new(),
            main_question: String::new(),
            strategy,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_main_question(mut self, main_question: impl Into<String>) -> Self {
        self.main_question = main_question.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_str() {
        assert_eq!(
            ExtractionStrategy::parse(ExtractionStrategy::Assisted.as_str()),
            ExtractionStrategy::Assisted
        );
        assert_eq!(
            ExtractionStrategy::parse(ExtractionStrategy::Heuristic.as_str()),
            ExtractionStrategy::Heuristic
        );
        assert_eq!(
            ExtractionStrategy::parse("something-else"),
            ExtractionStrategy::Heuristic
        );
    }

    #[test]
    fn builder_sets_fields() {
        let unit = DiscourseUnit::new("Berakhot 2a", ExtractionStrategy::Heuristic)
            .with_title("When to recite the evening Shema")
            .with_theme("Halakhic discourse");
        assert_eq!(unit.page_ref, "Berakhot 2a");
        assert_eq!(unit.title, "When to recite the evening Shema");
        assert_eq!(unit.theme, "Halakhic discourse");
        assert_eq!(unit.created_at, unit.updated_at);
    }
}

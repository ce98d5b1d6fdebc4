//! Derived edges between discourse nodes and source segments
//!
//! Edges are never independently authored state: the graph builder recomputes
//! the full edge set for a page whenever its steps are rewritten.

use serde::{Deserialize, Serialize};

/// Relationship kinds in the discourse graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Step k → step k+1: temporal/logical succession
    LeadsTo,
    /// Step → the step it responds to (tree edge)
    RepliesTo,
    /// Unit → step, and unit → originating segment
    Contains,
    /// Step → the segment it was derived from, when identifiable
    DerivedFrom,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadsTo => "leads_to",
            Self::RepliesTo => "replies_to",
            Self::Contains => "contains",
            Self::DerivedFrom => "derived_from",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "leads_to" => Some(Self::LeadsTo),
            "replies_to" => Some(Self::RepliesTo),
            "contains" => Some(Self::Contains),
            "derived_from" => Some(Self::DerivedFrom),
            _ => None,
        }
    }
}

/// A directed edge between two graph identities.
///
/// Endpoints are string ids: a unit's `page_ref`, a step's composite id, or
/// a segment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

//! Discourse graph data model
//!
//! A page of argumentative text maps to one [`DiscourseUnit`] plus an
//! ordered set of [`StepNode`]s connected by derived [`GraphEdge`]s.

mod edge;
mod step;
mod unit;

pub use edge::{EdgeKind, GraphEdge};
pub use step::{StepNode, StepType};
pub(crate) use step::step_id;
pub use unit::{DiscourseUnit, ExtractionStrategy};

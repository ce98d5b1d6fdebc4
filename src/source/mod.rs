//! Source text access: segments, page grouping, content normalization
//!
//! Segments are owned by an external store; this module only reads them,
//! groups them into pages, and flattens a page into one analysis string.

mod grouper;
mod normalize;
mod segment;

pub use grouper::{group_pages, parse_page_ref, PageGroup};
pub use normalize::ContentNormalizer;
pub(crate) use normalize::strip_tags;
pub use segment::{FileSegmentStore, InMemorySegmentStore, Segment, SegmentStore, SourceError};

//! manualrag-align
//!
//! Maps independently retrieved fragments back onto the reference document
//! they came from and renders the result as ordered, non-overlapping segments
//! for the chunk viewer.
pub mod highlight;
pub mod locate;
pub mod mapper;
pub mod stats;

pub use highlight::{cover, highlight, Segment};
pub use locate::{locate, Confidence, SpanLocator};
pub use mapper::ChunkMapper;
pub use stats::MappingStats;

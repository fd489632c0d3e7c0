//! tfn-analysis crate
//!
//! Graph construction and statistics for the transfer network: the flow
//! graph builder, per-club centrality measures, whole-graph summaries,
//! and visual scaling of metric values.

pub mod builder;
pub mod metrics;
pub mod normalize;
pub mod stats;

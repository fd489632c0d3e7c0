//! tfn-dashboard crate
//!
//! Turns a built transfer graph into the dashboard payload (nodes, edges,
//! summary tables, histogram, adjacency matrix) and embeds the single-page
//! HTML that renders it.

pub mod page;
pub mod view;

pub use view::{run_pipeline, DashboardData, RenderParams};

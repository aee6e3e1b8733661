//! JSON API types and chart descriptions for the web frontend.
//!
//! Field names are part of the frontend contract and must stay stable:
//! `instanceCount`, `cpuTotal`, `memoryTotalGB`, `diskTotalGB`.

pub mod charts;
pub mod convert;
pub mod inventory;

pub use charts::{ChartOrientation, ChartSeries, ChartSpec, region_charts, summary_charts};
pub use inventory::{ApiHost, ApiInventory, ApiRegionSummary, ApiTotals};

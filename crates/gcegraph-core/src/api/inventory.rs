//! Serializable inventory summary types.

use serde::Serialize;
use utoipa::ToSchema;

/// Totals over a set of hosts (the global entry).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiTotals {
    pub instance_count: usize,
    pub cpu_total: u64,
    /// Memory in GB, rounded to 2 decimals.
    #[serde(rename = "memoryTotalGB")]
    pub memory_total_gb: f64,
    #[serde(rename = "diskTotalGB")]
    pub disk_total_gb: u64,
}

/// Totals for one region.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiRegionSummary {
    /// Region name, e.g. "us-central1".
    pub region: String,
    pub instance_count: usize,
    pub cpu_total: u64,
    /// Memory in GB, rounded to 2 decimals.
    #[serde(rename = "memoryTotalGB")]
    pub memory_total_gb: f64,
    #[serde(rename = "diskTotalGB")]
    pub disk_total_gb: u64,
}

/// Full inventory returned by `GET /api/v1/inventory`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiInventory {
    /// Server version including git SHA.
    pub version: String,
    pub project: String,
    /// Unix timestamp (seconds) of the aggregation run.
    pub collected_at: i64,
    /// Sorted by region name.
    pub regions: Vec<ApiRegionSummary>,
    pub global: ApiTotals,
}

/// One aggregated host.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiHost {
    pub host: String,
    pub region: String,
    pub zone: String,
    pub machine_type: String,
    pub cpu: u32,
    pub memory_mb: f64,
    #[serde(rename = "diskGB")]
    pub disk_gb: u64,
}

//! Shared application state and global allocator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;

use gcegraph_core::api::{
    ApiHost, ApiInventory, ApiRegionSummary, ChartSpec, region_charts, summary_charts,
};
use gcegraph_core::inventory::Inventory;

/// Everything the handlers serve, computed once at startup.
///
/// Never mutated after construction, so handlers share it without locking.
pub(crate) struct WebApp {
    pub(crate) inventory: ApiInventory,
    pub(crate) hosts: Vec<ApiHost>,
    pub(crate) region_names: Vec<String>,
    pub(crate) regions: BTreeMap<String, ApiRegionSummary>,
    pub(crate) summary_charts: Vec<ChartSpec>,
    pub(crate) region_charts: BTreeMap<String, Vec<ChartSpec>>,
}

impl WebApp {
    pub(crate) fn new(inventory: &Inventory) -> Self {
        let summary = &inventory.summary;
        Self {
            inventory: ApiInventory::from(inventory),
            hosts: inventory.hosts.iter().map(ApiHost::from).collect(),
            region_names: summary.region_names().map(str::to_string).collect(),
            regions: summary
                .regions
                .iter()
                .map(|(name, r)| (name.clone(), ApiRegionSummary::from(r)))
                .collect(),
            summary_charts: summary_charts(summary),
            region_charts: summary
                .regions
                .iter()
                .map(|(name, r)| (name.clone(), region_charts(r)))
                .collect(),
        }
    }
}

pub(crate) type SharedState = Arc<WebApp>;

pub(crate) type AppState = State<SharedState>;

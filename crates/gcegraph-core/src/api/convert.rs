//! Conversion from aggregation results to API types.

use crate::aggregate::HostRecord;
use crate::fmt::round2;
use crate::inventory::Inventory;
use crate::summary::{RegionSummary, Totals};

use super::inventory::{ApiHost, ApiInventory, ApiRegionSummary, ApiTotals};

impl From<&Totals> for ApiTotals {
    fn from(t: &Totals) -> Self {
        Self {
            instance_count: t.instance_count,
            cpu_total: t.cpu_total,
            memory_total_gb: round2(t.memory_total_gb()),
            disk_total_gb: t.disk_total_gb,
        }
    }
}

impl From<&RegionSummary> for ApiRegionSummary {
    fn from(r: &RegionSummary) -> Self {
        let t = ApiTotals::from(&r.totals);
        Self {
            region: r.region.clone(),
            instance_count: t.instance_count,
            cpu_total: t.cpu_total,
            memory_total_gb: t.memory_total_gb,
            disk_total_gb: t.disk_total_gb,
        }
    }
}

impl From<&HostRecord> for ApiHost {
    fn from(h: &HostRecord) -> Self {
        Self {
            host: h.host.clone(),
            region: h.region.clone(),
            zone: h.zone.clone(),
            machine_type: h.machine_type.clone(),
            cpu: h.cpu,
            memory_mb: h.memory_mb,
            disk_gb: h.disk_gb,
        }
    }
}

impl From<&Inventory> for ApiInventory {
    fn from(inv: &Inventory) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            project: inv.project.clone(),
            collected_at: inv.collected_at,
            regions: inv
                .summary
                .regions
                .values()
                .map(ApiRegionSummary::from)
                .collect(),
            global: ApiTotals::from(&inv.summary.global),
        }
    }
}

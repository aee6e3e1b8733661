//! Per-region and global resource totals.

use std::collections::BTreeMap;

use crate::aggregate::HostRecord;

/// MB per GB for memory totals.
pub const MB_PER_GB: f64 = 1024.0;

/// Totals over a set of hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub instance_count: usize,
    pub cpu_total: u64,
    /// Summed in MB; converted to GB only on read.
    pub memory_total_mb: f64,
    pub disk_total_gb: u64,
}

impl Totals {
    pub fn add(&mut self, host: &HostRecord) {
        self.instance_count += 1;
        self.cpu_total += u64::from(host.cpu);
        self.memory_total_mb += host.memory_mb;
        self.disk_total_gb += host.disk_gb;
    }

    pub fn memory_total_gb(&self) -> f64 {
        self.memory_total_mb / MB_PER_GB
    }
}

/// Totals for a single region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub totals: Totals,
}

/// Totals across all regions.
pub type GlobalSummary = Totals;

/// Immutable result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySummary {
    /// Keyed by exact region name; iteration order is sorted.
    pub regions: BTreeMap<String, RegionSummary>,
    pub global: GlobalSummary,
}

impl InventorySummary {
    pub fn region(&self, name: &str) -> Option<&RegionSummary> {
        self.regions.get(name)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.global.instance_count == 0
    }
}

/// Groups hosts by region (case-sensitive) and totals each group and the whole set.
pub fn summarize(hosts: &[HostRecord]) -> InventorySummary {
    let mut summary = InventorySummary::default();
    for host in hosts {
        summary
            .regions
            .entry(host.region.clone())
            .or_insert_with(|| RegionSummary {
                region: host.region.clone(),
                totals: Totals::default(),
            })
            .totals
            .add(host);
        summary.global.add(host);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, region: &str, cpu: u32, memory_mb: f64, disk_gb: u64) -> HostRecord {
        HostRecord {
            host: name.into(),
            region: region.into(),
            zone: format!("{region}-a"),
            machine_type: "n1-standard-1".into(),
            cpu,
            memory_mb,
            disk_gb,
        }
    }

    #[test]
    fn test_two_region_scenario() {
        let summary = summarize(&[
            host("a", "us-central1", 1, 3840.0, 10),
            host("b", "europe-west1", 2, 4096.0, 20),
        ]);

        let us = &summary.region("us-central1").unwrap().totals;
        assert_eq!(us.instance_count, 1);
        assert_eq!(us.cpu_total, 1);
        assert_eq!(us.disk_total_gb, 10);
        assert_eq!(us.memory_total_gb(), 3.75);

        let eu = &summary.region("europe-west1").unwrap().totals;
        assert_eq!(
            (eu.instance_count, eu.cpu_total, eu.disk_total_gb),
            (1, 2, 20)
        );
        assert_eq!(eu.memory_total_gb(), 4.0);

        assert_eq!(summary.global.instance_count, 2);
        assert_eq!(summary.global.cpu_total, 3);
        assert_eq!(summary.global.disk_total_gb, 30);
        assert_eq!(summary.global.memory_total_gb(), 7.75);
    }

    #[test]
    fn test_partition_totals_equal_global() {
        let hosts: Vec<HostRecord> = (0..37)
            .map(|i| {
                let region = ["us-central1", "europe-west1", "asia-east1"][i % 3];
                host(&format!("h{i}"), region, (i % 8 + 1) as u32, 614.4 * i as f64, 10 * i as u64)
            })
            .collect();
        let summary = summarize(&hosts);

        let sum = summary.regions.values().fold(Totals::default(), |mut acc, r| {
            acc.instance_count += r.totals.instance_count;
            acc.cpu_total += r.totals.cpu_total;
            acc.disk_total_gb += r.totals.disk_total_gb;
            acc.memory_total_mb += r.totals.memory_total_mb;
            acc
        });
        assert_eq!(sum.instance_count, summary.global.instance_count);
        assert_eq!(sum.cpu_total, summary.global.cpu_total);
        assert_eq!(sum.disk_total_gb, summary.global.disk_total_gb);
        assert!((sum.memory_total_mb - summary.global.memory_total_mb).abs() < 1e-6);
    }

    #[test]
    fn test_memory_not_rounded_before_summation() {
        // Each host alone rounds to 0.00 GB; the sum must not.
        let hosts: Vec<HostRecord> = (0..100)
            .map(|i| host(&format!("h{i}"), "us-central1", 1, 4.0, 1))
            .collect();
        let summary = summarize(&hosts);
        assert_eq!(summary.global.memory_total_mb, 400.0);
        assert!((summary.global.memory_total_gb() - 0.390625).abs() < 1e-12);
    }

    #[test]
    fn test_region_grouping_is_case_sensitive() {
        let summary = summarize(&[
            host("a", "us-central1", 1, 1.0, 1),
            host("b", "US-CENTRAL1", 1, 1.0, 1),
        ]);
        assert_eq!(summary.regions.len(), 2);
    }

    #[test]
    fn test_empty_host_set() {
        let summary = summarize(&[]);
        assert!(summary.regions.is_empty());
        assert!(summary.is_empty());
        assert_eq!(summary.global, Totals::default());
        assert_eq!(summary.global.memory_total_gb(), 0.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = host("a", "us-central1", 1, 3840.0, 10);
        let b = host("b", "europe-west1", 2, 4096.0, 20);
        let c = host("c", "us-central1", 4, 15360.0, 100);
        assert_eq!(
            summarize(&[a.clone(), b.clone(), c.clone()]),
            summarize(&[c, a, b])
        );
    }
}

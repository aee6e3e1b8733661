//! Bar chart descriptions for the summary and region pages.
//!
//! The server decides what is charted; the frontend only draws bars.

use serde::Serialize;
use utoipa::ToSchema;

use crate::fmt::{format_gb, round2};
use crate::summary::{InventorySummary, RegionSummary};

const SUMMARY_WIDTH: u32 = 750;
const SUMMARY_HEIGHT: u32 = 300;
const REGION_WIDTH: u32 = 900;
const REGION_HEIGHT: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartOrientation {
    /// Bars grow upwards.
    Vertical,
    /// Bars grow to the right.
    Horizontal,
}

/// One bar.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub label: String,
    pub value: f64,
    /// Value label drawn next to the bar: GB amounts with two decimals, counts as integers.
    pub display: String,
}

/// A titled bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSpec {
    /// Stable identifier, usable as a DOM id.
    pub key: String,
    pub title: String,
    pub orientation: ChartOrientation,
    pub width: u32,
    pub height: u32,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    fn summary(key: &str, title: &str, series: Vec<ChartSeries>) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            orientation: ChartOrientation::Vertical,
            width: SUMMARY_WIDTH,
            height: SUMMARY_HEIGHT,
            series,
        }
    }

    fn region(key: &str, title: String, series: Vec<ChartSeries>) -> Self {
        Self {
            key: key.to_string(),
            title,
            orientation: ChartOrientation::Horizontal,
            width: REGION_WIDTH,
            height: REGION_HEIGHT,
            series,
        }
    }
}

fn count(label: impl Into<String>, n: u64) -> ChartSeries {
    ChartSeries {
        label: label.into(),
        value: n as f64,
        display: n.to_string(),
    }
}

fn gb(label: impl Into<String>, value: f64) -> ChartSeries {
    ChartSeries {
        label: label.into(),
        value: round2(value),
        display: format_gb(value),
    }
}

fn per_region<F>(summary: &InventorySummary, bar: F) -> Vec<ChartSeries>
where
    F: Fn(&RegionSummary) -> ChartSeries,
{
    summary.regions.values().map(bar).collect()
}

/// Charts for the summary page: four per-region breakdowns and two global totals.
pub fn summary_charts(summary: &InventorySummary) -> Vec<ChartSpec> {
    let global = &summary.global;
    vec![
        ChartSpec::summary(
            "instances",
            "Instance Count By Region",
            per_region(summary, |r| {
                count(r.region.clone(), r.totals.instance_count as u64)
            }),
        ),
        ChartSpec::summary(
            "cpus",
            "CPU Count By Region",
            per_region(summary, |r| count(r.region.clone(), r.totals.cpu_total)),
        ),
        ChartSpec::summary(
            "disk",
            "Disk Usage By Region (GB)",
            per_region(summary, |r| count(r.region.clone(), r.totals.disk_total_gb)),
        ),
        ChartSpec::summary(
            "memory",
            "Memory Usage By Region (GB)",
            per_region(summary, |r| gb(r.region.clone(), r.totals.memory_total_gb())),
        ),
        ChartSpec::summary(
            "instances-cpus",
            "Instance And CPU Count All Regions",
            vec![
                count("Instances", global.instance_count as u64),
                count("CPUs", global.cpu_total),
            ],
        ),
        ChartSpec::summary(
            "memory-disk",
            "Memory and Disk Usage All Regions (GB)",
            vec![
                gb("Memory", global.memory_total_gb()),
                count("Disk", global.disk_total_gb),
            ],
        ),
    ]
}

/// Charts for a single region page.
pub fn region_charts(region: &RegionSummary) -> Vec<ChartSpec> {
    let title = format!("Resource Usage for {}", region.region);
    let t = &region.totals;
    vec![
        ChartSpec::region(
            "resources",
            title.clone(),
            vec![
                count("Instances", t.instance_count as u64),
                count("CPUs", t.cpu_total),
            ],
        ),
        ChartSpec::region(
            "memory-disk",
            title,
            vec![
                gb("Memory (GB)", t.memory_total_gb()),
                count("Disk (GB)", t.disk_total_gb),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::HostRecord;
    use crate::summary::summarize;

    fn summary() -> InventorySummary {
        let host = |name: &str, region: &str, cpu, memory_mb, disk_gb| HostRecord {
            host: name.into(),
            region: region.into(),
            zone: format!("{region}-a"),
            machine_type: "t".into(),
            cpu,
            memory_mb,
            disk_gb,
        };
        summarize(&[
            host("a", "us-central1", 1, 3840.0, 10),
            host("b", "europe-west1", 2, 4096.0, 20),
        ])
    }

    #[test]
    fn test_summary_charts() {
        let charts = summary_charts(&summary());
        let titles: Vec<&str> = charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Instance Count By Region",
                "CPU Count By Region",
                "Disk Usage By Region (GB)",
                "Memory Usage By Region (GB)",
                "Instance And CPU Count All Regions",
                "Memory and Disk Usage All Regions (GB)",
            ]
        );
        assert!(charts.iter().all(|c| c.orientation == ChartOrientation::Vertical));

        assert_eq!(
            charts[3].series,
            vec![gb("europe-west1", 4.0), gb("us-central1", 3.75)]
        );
        assert_eq!(charts[4].series, vec![count("Instances", 2), count("CPUs", 3)]);
        assert_eq!(charts[5].series, vec![gb("Memory", 7.75), count("Disk", 30)]);
    }

    #[test]
    fn test_summary_charts_empty_inventory() {
        let charts = summary_charts(&InventorySummary::default());
        assert_eq!(charts.len(), 6);
        assert!(charts[0].series.is_empty());
        assert_eq!(charts[4].series, vec![count("Instances", 0), count("CPUs", 0)]);
    }

    #[test]
    fn test_region_charts() {
        let s = summary();
        let charts = region_charts(s.region("us-central1").unwrap());
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].title, "Resource Usage for us-central1");
        assert_eq!(charts[0].orientation, ChartOrientation::Horizontal);
        assert_eq!((charts[0].width, charts[0].height), (900, 400));
        assert_eq!(
            charts[1].series,
            vec![gb("Memory (GB)", 3.75), count("Disk (GB)", 10)]
        );
    }

    #[test]
    fn test_chart_json_shape() {
        let json = serde_json::to_value(&region_charts(summary().region("europe-west1").unwrap()))
            .unwrap();
        assert_eq!(json[0]["orientation"], "horizontal");
        assert_eq!(json[0]["series"][1]["label"], "CPUs");
        assert_eq!(json[0]["series"][1]["value"], 2.0);
        assert_eq!(json[0]["series"][1]["display"], "2");
    }

    #[test]
    fn test_memory_bars_display_two_decimals() {
        let s = summary();
        let region = region_charts(s.region("europe-west1").unwrap());
        assert_eq!(region[1].series[0].display, "4.00");
        assert_eq!(region[1].series[1].display, "20");

        let charts = summary_charts(&s);
        let memory: Vec<&str> = charts[3].series.iter().map(|b| b.display.as_str()).collect();
        assert_eq!(memory, vec!["4.00", "3.75"]);
        assert_eq!(charts[5].series[0].display, "7.75");
    }
}

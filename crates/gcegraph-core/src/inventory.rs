//! End-to-end inventory collection.
//!
//! Drains machine types, instances and disks (in that order), resolves
//! sizes, joins hosts and summarizes them. A run is all-or-nothing: the
//! first provider or data error aborts it.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::aggregate::{AggregateError, HostRecord, aggregate_hosts};
use crate::collector::resources::{Disk, Instance, MachineType};
use crate::collector::{CollectError, PageSource, Pager, ResourceKind};
use crate::fmt::{format_gb, format_ms};
use crate::resolver::{OverrideTable, SizeCatalog};
use crate::summary::{InventorySummary, summarize};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("collecting {kind} failed: {source}")]
    Collect {
        kind: ResourceKind,
        source: CollectError,
    },
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Timing and volume of the last run.
#[derive(Debug, Clone, Default)]
pub struct InventoryTiming {
    pub total: Duration,
    pub machine_types: Duration,
    pub instances: Duration,
    pub disks: Duration,
    /// Aggregation and summarization.
    pub aggregate: Duration,
    pub machine_type_pages: usize,
    pub instance_pages: usize,
    pub disk_pages: usize,
}

/// Result of one collection run.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub project: String,
    /// Unix timestamp (seconds) when the run finished.
    pub collected_at: i64,
    pub hosts: Vec<HostRecord>,
    pub summary: InventorySummary,
}

/// Runs collection against a page source for one project.
pub struct InventoryCollector<S: PageSource> {
    source: S,
    project: String,
    overrides: OverrideTable,
    last_timing: Option<InventoryTiming>,
}

impl<S: PageSource> InventoryCollector<S> {
    pub fn new(source: S, project: impl Into<String>) -> Self {
        Self {
            source,
            project: project.into(),
            overrides: OverrideTable::new(),
            last_timing: None,
        }
    }

    /// Sets the user override table applied on top of the provider catalog.
    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Timing of the last successful `collect` call.
    pub fn last_timing(&self) -> Option<&InventoryTiming> {
        self.last_timing.as_ref()
    }

    fn drain<T: serde::de::DeserializeOwned>(
        &self,
        kind: ResourceKind,
    ) -> Result<(Vec<T>, usize, Duration), InventoryError> {
        let start = Instant::now();
        let mut pager: Pager<_, T> = Pager::new(&self.source, kind, &self.project);
        let items = pager
            .drain()
            .map_err(|source| InventoryError::Collect { kind, source })?;
        Ok((items, pager.pages_fetched(), start.elapsed()))
    }

    /// Performs one full collection run.
    pub fn collect(&mut self) -> Result<Inventory, InventoryError> {
        let start = Instant::now();
        let mut timing = InventoryTiming::default();
        info!(project = %self.project, "collecting inventory");

        let (machine_types, pages, elapsed) = self.drain::<MachineType>(ResourceKind::MachineTypes)?;
        timing.machine_types = elapsed;
        timing.machine_type_pages = pages;
        let catalog = SizeCatalog::from_machine_types(machine_types).overlay(&self.overrides);
        debug!(
            entries = catalog.len(),
            overrides = self.overrides.len(),
            pages,
            elapsed = %format_ms(elapsed),
            "machine type catalog built"
        );

        let (instances, pages, elapsed) = self.drain::<Instance>(ResourceKind::Instances)?;
        timing.instances = elapsed;
        timing.instance_pages = pages;
        debug!(count = instances.len(), pages, elapsed = %format_ms(elapsed), "instances collected");

        // Fail before paging through disks if any host cannot be sized.
        if let Some(instance) = instances
            .iter()
            .find(|i| catalog.lookup(i.machine_type_name()).is_err())
        {
            return Err(AggregateError::CustomInstance {
                host: instance.name.clone(),
                machine_type: instance.machine_type_name().to_string(),
            }
            .into());
        }

        let (disks, pages, elapsed) = self.drain::<Disk>(ResourceKind::Disks)?;
        timing.disks = elapsed;
        timing.disk_pages = pages;
        debug!(count = disks.len(), pages, elapsed = %format_ms(elapsed), "disks collected");

        let agg_start = Instant::now();
        let hosts = aggregate_hosts(&catalog, instances, disks)?;
        let summary = summarize(&hosts);
        timing.aggregate = agg_start.elapsed();
        timing.total = start.elapsed();

        info!(
            project = %self.project,
            hosts = summary.global.instance_count,
            regions = summary.regions.len(),
            cpus = summary.global.cpu_total,
            memory_gb = %format_gb(summary.global.memory_total_gb()),
            disk_gb = summary.global.disk_total_gb,
            elapsed = %format_ms(timing.total),
            "inventory collected"
        );
        self.last_timing = Some(timing);

        Ok(Inventory {
            project: self.project.clone(),
            collected_at: Utc::now().timestamp(),
            hosts,
            summary,
        })
    }
}

//! Joins instances, machine sizes and disks into per-host records.
//!
//! ## Disk matching
//!
//! A host's disk size is the sum of every disk the instance lists as
//! attached (`disks[].source`). Instances that list no attachment sources
//! fall back to the disk that shares the host's name in the host's zone.
//! Disks are keyed by `(zone or region, name)`, since disk names are only
//! unique within a location. A referenced disk absent from the disk list, or
//! an attachment source that is not a disk URL, is an error, never a zero.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::collector::resources::{Disk, Instance, parse_disk_source};
use crate::resolver::SizeCatalog;

/// Resource usage of one live instance.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRecord {
    pub host: String,
    pub region: String,
    pub zone: String,
    pub machine_type: String,
    pub cpu: u32,
    pub memory_mb: f64,
    pub disk_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// The instance's machine type is in neither the catalog nor the overrides.
    #[error(
        "custom instance size {machine_type} (host {host}) must be added to the custom sizes table"
    )]
    CustomInstance { host: String, machine_type: String },
    /// The instance references a disk the disk listing does not contain.
    #[error("no disk {disk} found for host {host}")]
    MissingDisk { host: String, disk: String },
}

/// Instance with its size resolved, waiting for the disk join.
struct ResolvedInstance {
    record: HostRecord,
    /// `(location, disk name)` of each attached disk.
    attached: Vec<(String, String)>,
}

fn resolve_instance(
    catalog: &SizeCatalog,
    instance: Instance,
) -> Result<ResolvedInstance, AggregateError> {
    let machine_type = instance.machine_type_name().to_string();
    let size = catalog
        .lookup(&machine_type)
        .map_err(|_| AggregateError::CustomInstance {
            host: instance.name.clone(),
            machine_type: machine_type.clone(),
        })?;

    let zone = instance.zone_name().to_string();
    let region = instance.region().to_string();

    let mut attached = Vec::with_capacity(instance.disks.len());
    for source in instance.disks.iter().filter_map(|d| d.source.as_deref()) {
        let (loc, name) =
            parse_disk_source(source).ok_or_else(|| AggregateError::MissingDisk {
                host: instance.name.clone(),
                disk: source.to_string(),
            })?;
        attached.push((loc.to_string(), name.to_string()));
    }
    // Only an instance without any attachment source falls back to its name.
    if attached.is_empty() {
        attached.push((zone.clone(), instance.name.clone()));
    }

    Ok(ResolvedInstance {
        record: HostRecord {
            host: instance.name,
            region,
            zone,
            machine_type,
            cpu: size.vcpus,
            memory_mb: size.memory_mb,
            disk_gb: 0,
        },
        attached,
    })
}

/// Builds one `HostRecord` per instance, sorted by host name.
///
/// Fails on the first instance whose machine type cannot be resolved, and on
/// any host whose disks are missing from `disks`. Duplicate host names keep
/// the last instance seen.
pub fn aggregate_hosts<I, D>(
    catalog: &SizeCatalog,
    instances: I,
    disks: D,
) -> Result<Vec<HostRecord>, AggregateError>
where
    I: IntoIterator<Item = Instance>,
    D: IntoIterator<Item = Disk>,
{
    let mut resolved: BTreeMap<String, ResolvedInstance> = BTreeMap::new();
    for instance in instances {
        let r = resolve_instance(catalog, instance)?;
        if let Some(prev) = resolved.insert(r.record.host.clone(), r) {
            warn!(host = %prev.record.host, "duplicate host name, keeping last");
        }
    }

    let disk_sizes: HashMap<(String, String), u64> = disks
        .into_iter()
        .map(|d| ((d.location().to_string(), d.name.clone()), d.size_gb))
        .collect();

    let mut hosts = Vec::with_capacity(resolved.len());
    for (_, ResolvedInstance { mut record, attached }) in resolved {
        let mut total = 0u64;
        for key in &attached {
            let size = disk_sizes
                .get(key)
                .ok_or_else(|| AggregateError::MissingDisk {
                    host: record.host.clone(),
                    disk: format!("{}/{}", key.0, key.1),
                })?;
            total += size;
        }
        record.disk_gb = total;
        debug!(
            host = %record.host,
            region = %record.region,
            cpu = record.cpu,
            memory_mb = record.memory_mb,
            disk_gb = record.disk_gb,
            disks = attached.len(),
            "host aggregated"
        );
        hosts.push(record);
    }
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::resources::{AttachedDisk, MachineType};
    use crate::resolver::{MachineSize, OverrideTable};

    fn catalog() -> SizeCatalog {
        let mut overrides = OverrideTable::new();
        overrides.insert("custom-2-4096", MachineSize::new(2, 4096.0));
        SizeCatalog::from_machine_types(vec![MachineType {
            name: "n1-standard-1".into(),
            guest_cpus: 1,
            memory_mb: 3840.0,
        }])
        .overlay(&overrides)
    }

    fn instance(name: &str, zone: &str, machine_type: &str) -> Instance {
        Instance {
            name: name.into(),
            zone: format!("projects/p/zones/{zone}"),
            machine_type: format!("projects/p/zones/{zone}/machineTypes/{machine_type}"),
            disks: Vec::new(),
        }
    }

    fn disk(name: &str, zone: &str, size_gb: u64) -> Disk {
        Disk {
            name: name.into(),
            zone: Some(format!("projects/p/zones/{zone}")),
            region: None,
            size_gb,
        }
    }

    fn attach(instance: &mut Instance, zone: &str, disk: &str) {
        instance.disks.push(AttachedDisk {
            source: Some(format!("projects/p/zones/{zone}/disks/{disk}")),
        });
    }

    #[test]
    fn test_two_hosts_by_name_match() {
        let hosts = aggregate_hosts(
            &catalog(),
            vec![
                instance("a", "us-central1-a", "n1-standard-1"),
                instance("b", "europe-west1-b", "custom-2-4096"),
            ],
            vec![disk("a", "us-central1-a", 10), disk("b", "europe-west1-b", 20)],
        )
        .unwrap();

        assert_eq!(
            hosts,
            vec![
                HostRecord {
                    host: "a".into(),
                    region: "us-central1".into(),
                    zone: "us-central1-a".into(),
                    machine_type: "n1-standard-1".into(),
                    cpu: 1,
                    memory_mb: 3840.0,
                    disk_gb: 10,
                },
                HostRecord {
                    host: "b".into(),
                    region: "europe-west1".into(),
                    zone: "europe-west1-b".into(),
                    machine_type: "custom-2-4096".into(),
                    cpu: 2,
                    memory_mb: 4096.0,
                    disk_gb: 20,
                },
            ]
        );
    }

    #[test]
    fn test_unresolved_machine_type_fails_run() {
        let err = aggregate_hosts(
            &catalog(),
            vec![
                instance("a", "us-central1-a", "n1-standard-1"),
                instance("c", "us-central1-a", "custom-6-23040"),
            ],
            vec![disk("a", "us-central1-a", 10), disk("c", "us-central1-a", 10)],
        )
        .unwrap_err();

        assert_eq!(
            err,
            AggregateError::CustomInstance {
                host: "c".into(),
                machine_type: "custom-6-23040".into(),
            }
        );
        assert!(err.to_string().contains("custom-6-23040"));
    }

    #[test]
    fn test_missing_disk_fails() {
        let err = aggregate_hosts(
            &catalog(),
            vec![instance("a", "us-central1-a", "n1-standard-1")],
            vec![disk("a", "us-central1-b", 10)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AggregateError::MissingDisk {
                host: "a".into(),
                disk: "us-central1-a/a".into(),
            }
        );
    }

    #[test]
    fn test_attached_disks_are_summed() {
        let mut db = instance("db", "us-east1-c", "n1-standard-1");
        attach(&mut db, "us-east1-c", "db-boot");
        attach(&mut db, "us-east1-c", "db-data");

        let hosts = aggregate_hosts(
            &catalog(),
            vec![db],
            vec![
                disk("db-boot", "us-east1-c", 50),
                disk("db-data", "us-east1-c", 500),
                disk("db", "us-east1-c", 7),
            ],
        )
        .unwrap();
        assert_eq!(hosts[0].disk_gb, 550);
    }

    #[test]
    fn test_attached_disk_missing_is_named() {
        let mut db = instance("db", "us-east1-c", "n1-standard-1");
        attach(&mut db, "us-east1-c", "db-boot");
        attach(&mut db, "us-east1-c", "db-scratch");

        let err = aggregate_hosts(&catalog(), vec![db], vec![disk("db-boot", "us-east1-c", 50)])
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingDisk { ref disk, .. } if disk == "us-east1-c/db-scratch"));
    }

    #[test]
    fn test_unparseable_attachment_source_fails() {
        let mut db = instance("db", "us-east1-c", "n1-standard-1");
        attach(&mut db, "us-east1-c", "db");
        db.disks.push(AttachedDisk {
            source: Some("projects/p/zones/us-east1-c/snapshots/db-data".into()),
        });

        let err = aggregate_hosts(&catalog(), vec![db], vec![disk("db", "us-east1-c", 50)])
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::MissingDisk {
                host: "db".into(),
                disk: "projects/p/zones/us-east1-c/snapshots/db-data".into(),
            }
        );
    }

    #[test]
    fn test_only_unparseable_source_does_not_fall_back_to_host_name() {
        let mut db = instance("db", "us-east1-c", "n1-standard-1");
        db.disks.push(AttachedDisk {
            source: Some("db-data".into()),
        });

        let err = aggregate_hosts(&catalog(), vec![db], vec![disk("db", "us-east1-c", 50)])
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingDisk { ref disk, .. } if disk == "db-data"));
    }

    #[test]
    fn test_regional_disk_attachment() {
        let mut ha = instance("ha", "us-east1-c", "n1-standard-1");
        ha.disks.push(AttachedDisk {
            source: Some("projects/p/regions/us-east1/disks/shared".into()),
        });
        let shared = Disk {
            name: "shared".into(),
            zone: None,
            region: Some("projects/p/regions/us-east1".into()),
            size_gb: 200,
        };
        let hosts = aggregate_hosts(&catalog(), vec![ha], vec![shared]).unwrap();
        assert_eq!(hosts[0].disk_gb, 200);
    }

    #[test]
    fn test_duplicate_host_last_write_wins() {
        let hosts = aggregate_hosts(
            &catalog(),
            vec![
                instance("a", "us-central1-a", "n1-standard-1"),
                instance("a", "us-central1-a", "custom-2-4096"),
            ],
            vec![disk("a", "us-central1-a", 10)],
        )
        .unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].cpu, 2);
    }

    #[test]
    fn test_no_instances() {
        let hosts = aggregate_hosts(&catalog(), Vec::<Instance>::new(), vec![disk("x", "us-central1-a", 10)])
            .unwrap();
        assert!(hosts.is_empty());
    }
}

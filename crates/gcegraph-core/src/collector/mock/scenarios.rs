//! Pre-built project inventories for testing.

use serde_json::json;

use super::pages::MockPages;
use crate::collector::traits::ResourceKind;

const API: &str = "https://compute.googleapis.com/compute/v1/projects/demo";

fn zone_url(zone: &str) -> String {
    format!("{API}/zones/{zone}")
}

fn instance(name: &str, zone: &str, machine_type: &str) -> serde_json::Value {
    json!({
        "name": name,
        "zone": zone_url(zone),
        "machineType": format!("{}/machineTypes/{}", zone_url(zone), machine_type),
        "status": "RUNNING",
        "disks": [{"source": format!("{}/disks/{}", zone_url(zone), name), "boot": true}],
    })
}

fn machine_type(name: &str, cpus: u32, memory_mb: u32, zone: &str) -> serde_json::Value {
    json!({
        "name": name,
        "guestCpus": cpus,
        "memoryMb": memory_mb,
        "zone": zone,
    })
}

fn disk(name: &str, user: &str, zone: &str, size_gb: u64) -> serde_json::Value {
    json!({
        "name": name,
        "zone": zone_url(zone),
        "sizeGb": size_gb.to_string(),
        "users": [format!("{}/instances/{}", zone_url(zone), user)],
    })
}

impl MockPages {
    /// Two hosts in two regions, one of them on a custom machine type.
    ///
    /// - `web-1`: us-central1-a, n1-standard-1 (1 vCPU, 3840 MB), 10 GB disk
    /// - `batch-1`: europe-west1-b, custom-2-4096 (not in the catalog), 20 GB disk
    ///
    /// Resolving `batch-1` needs an override `{'custom-2-4096': (2, 4096)}`.
    pub fn two_region_project() -> Self {
        let mut pages = Self::new();

        pages.push_page(
            ResourceKind::MachineTypes,
            json!({
                "zones/us-central1-a": {"machineTypes": [
                    machine_type("n1-standard-1", 1, 3840, "us-central1-a"),
                    machine_type("n1-standard-2", 2, 7680, "us-central1-a"),
                ]},
                "zones/asia-east1-a": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
            }),
        );
        pages.push_page(
            ResourceKind::MachineTypes,
            json!({
                "zones/europe-west1-b": {"machineTypes": [
                    machine_type("n1-standard-1", 1, 3840, "europe-west1-b"),
                ]},
            }),
        );

        pages.push_page(
            ResourceKind::Instances,
            json!({
                "zones/us-central1-a": {"instances": [instance("web-1", "us-central1-a", "n1-standard-1")]},
                "zones/us-east1-b": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
            }),
        );
        pages.push_page(
            ResourceKind::Instances,
            json!({
                "zones/europe-west1-b": {"instances": [instance("batch-1", "europe-west1-b", "custom-2-4096")]},
            }),
        );

        pages.push_page(
            ResourceKind::Disks,
            json!({
                "zones/us-central1-a": {"disks": [disk("web-1", "web-1", "us-central1-a", 10)]},
                "zones/europe-west1-b": {"disks": [disk("batch-1", "batch-1", "europe-west1-b", 20)]},
            }),
        );

        pages
    }

    /// A project with no instances at all; every scope reports a warning.
    pub fn empty_project() -> Self {
        let mut pages = Self::new();
        pages.push_page(
            ResourceKind::MachineTypes,
            json!({
                "zones/us-central1-a": {"machineTypes": [
                    machine_type("n1-standard-1", 1, 3840, "us-central1-a"),
                ]},
            }),
        );
        pages.push_page(
            ResourceKind::Instances,
            json!({
                "zones/us-central1-a": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
            }),
        );
        pages.push_page(
            ResourceKind::Disks,
            json!({
                "zones/us-central1-a": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
            }),
        );
        pages
    }

    /// One host with a boot disk and a separately named data disk.
    ///
    /// - `db-1`: us-east1-c, n1-standard-2, boot 50 GB + `db-1-data` 500 GB
    pub fn multi_disk_project() -> Self {
        let mut pages = Self::new();
        pages.push_page(
            ResourceKind::MachineTypes,
            json!({
                "zones/us-east1-c": {"machineTypes": [
                    machine_type("n1-standard-2", 2, 7680, "us-east1-c"),
                ]},
            }),
        );
        pages.push_page(
            ResourceKind::Instances,
            json!({
                "zones/us-east1-c": {"instances": [{
                    "name": "db-1",
                    "zone": zone_url("us-east1-c"),
                    "machineType": format!("{}/machineTypes/n1-standard-2", zone_url("us-east1-c")),
                    "disks": [
                        {"source": format!("{}/disks/db-1", zone_url("us-east1-c")), "boot": true},
                        {"source": format!("{}/disks/db-1-data", zone_url("us-east1-c")), "boot": false},
                    ],
                }]},
            }),
        );
        pages.push_page(
            ResourceKind::Disks,
            json!({
                "zones/us-east1-c": {"disks": [
                    disk("db-1", "db-1", "us-east1-c", 50),
                    disk("db-1-data", "db-1", "us-east1-c", 500),
                ]},
            }),
        );
        pages
    }
}

//! Typed views of the Compute API resources the aggregator joins.
//!
//! Only the fields needed for aggregation are decoded; everything else in
//! the provider payload is ignored.

use serde::{Deserialize, Deserializer};

/// A VM instance entry from `aggregated/instances`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// Zone URL, e.g. `https://.../zones/us-central1-a`.
    pub zone: String,
    /// Machine type URL, e.g. `https://.../machineTypes/n1-standard-1`.
    pub machine_type: String,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
}

impl Instance {
    /// Machine type name (trailing path segment of `machineType`).
    pub fn machine_type_name(&self) -> &str {
        last_segment(&self.machine_type)
    }

    /// Zone name (trailing path segment of `zone`).
    pub fn zone_name(&self) -> &str {
        last_segment(&self.zone)
    }

    /// Region derived from the zone: `us-central1-a` -> `us-central1`.
    pub fn region(&self) -> &str {
        region_of_zone(self.zone_name())
    }
}

/// A disk attachment listed on an instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    /// Disk URL, e.g. `https://.../zones/us-central1-a/disks/web-1`.
    #[serde(default)]
    pub source: Option<String>,
}

/// A machine type entry from `aggregated/machineTypes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineType {
    pub name: String,
    pub guest_cpus: u32,
    pub memory_mb: f64,
}

/// A persistent disk entry from `aggregated/disks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub name: String,
    /// Zone URL for zonal disks.
    #[serde(default)]
    pub zone: Option<String>,
    /// Region URL for regional disks.
    #[serde(default)]
    pub region: Option<String>,
    /// The API encodes int64 as a JSON string.
    #[serde(deserialize_with = "de_u64_lenient")]
    pub size_gb: u64,
}

impl Disk {
    /// Zone or region name the disk lives in.
    pub fn location(&self) -> &str {
        self.zone
            .as_deref()
            .or(self.region.as_deref())
            .map(last_segment)
            .unwrap_or("")
    }
}

/// Returns the trailing `/`-separated segment of a resource reference.
pub fn last_segment(reference: &str) -> &str {
    reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(reference)
}

/// Strips the zone suffix: `europe-west1-b` -> `europe-west1`.
///
/// A name without `-` is returned unchanged.
pub fn region_of_zone(zone: &str) -> &str {
    zone.rsplit_once('-').map(|(region, _)| region).unwrap_or(zone)
}

/// Parses a disk URL into `(location, name)`.
///
/// Accepts `.../zones/{zone}/disks/{name}` and `.../regions/{region}/disks/{name}`.
pub fn parse_disk_source(source: &str) -> Option<(&str, &str)> {
    let segments: Vec<&str> = source.trim_end_matches('/').split('/').collect();
    let idx = segments.iter().rposition(|s| *s == "disks")?;
    let name = segments.get(idx + 1)?;
    let location = segments.get(idx.checked_sub(1)?)?;
    if name.is_empty() || location.is_empty() {
        return None;
    }
    Some((location, name))
}

fn de_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

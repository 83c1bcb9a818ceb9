//! The Carbon Intensity Cache's persisted snapshot — the only coupling
//! between CIC and CAPE/SIM (spec.md §3, §5, §6).
//!
//! `Snapshot` is the in-memory value; [`write_atomic`] and [`load`] are the
//! filesystem boundary. The wire format tolerates two historical layouts
//! (flat and one-level-nested `regions.regions`) — [`load`] normalizes both
//! into the canonical shape and the ambiguity never leaks past this module
//! (spec.md §9 "Ad-hoc JSON flattening").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// A single region's carbon-intensity reading (spec.md §3 "Region").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Equal to its own key in the snapshot's region map.
    pub zone: String,
    /// grams CO2-equivalent per kWh. Invariant: strictly positive.
    pub carbon_intensity: f64,
    /// Source measurement timestamp, if the upstream service provided one.
    pub datetime: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub emission_factor_type: Option<String>,
    pub is_estimated: bool,
    pub estimation_method: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Wire representation of a region record (§6), before the `moer` fallback
/// and key-equals-zone normalization are applied.
#[derive(Debug, Deserialize)]
struct RawRegion {
    zone: Option<String>,
    #[serde(rename = "carbonIntensity")]
    carbon_intensity: Option<f64>,
    moer: Option<f64>,
    datetime: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "emissionFactorType")]
    emission_factor_type: Option<String>,
    #[serde(rename = "isEstimated")]
    is_estimated: Option<bool>,
    #[serde(rename = "estimationMethod")]
    estimation_method: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct WireRegion<'a> {
    zone: &'a str,
    #[serde(rename = "carbonIntensity")]
    carbon_intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    datetime: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "emissionFactorType", skip_serializing_if = "Option::is_none")]
    emission_factor_type: Option<&'a str>,
    #[serde(rename = "isEstimated")]
    is_estimated: bool,
    #[serde(rename = "estimationMethod", skip_serializing_if = "Option::is_none")]
    estimation_method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

/// An atomic, timestamped mapping from region tag to [`Region`] (spec.md §3
/// "Snapshot").
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
    pub regions: BTreeMap<String, Region>,
    pub sorted_by_carbon: Vec<String>,
    pub best_region: Option<String>,
    pub worst_region: Option<String>,
}

impl Snapshot {
    /// Build a snapshot from a region map, deriving the sorted order and
    /// best/worst tags (spec.md §3 invariants).
    pub fn from_regions(created_at: DateTime<Utc>, ttl: Duration, regions: BTreeMap<String, Region>) -> Self {
        let mut sorted_by_carbon: Vec<String> = regions.keys().cloned().collect();
        sorted_by_carbon.sort_by(|a, b| {
            regions[a]
                .carbon_intensity
                .partial_cmp(&regions[b].carbon_intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        let best_region = sorted_by_carbon.first().cloned();
        let worst_region = sorted_by_carbon.last().cloned();
        Self {
            created_at,
            ttl,
            regions,
            sorted_by_carbon,
            best_region,
            worst_region,
        }
    }

    /// Whether this snapshot is expired: `now - created > ttl` (spec.md §3).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age > chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }

    /// Current intensity for a region tag, if present.
    pub fn intensity_of(&self, tag: &str) -> Option<f64> {
        self.regions.get(tag).map(|r| r.carbon_intensity)
    }
}

/// Wire envelope matching spec.md §6 exactly.
#[derive(Debug, Serialize)]
struct WireSnapshot<'a> {
    timestamp: DateTime<Utc>,
    ttl_minutes: i64,
    regions: BTreeMap<&'a str, WireRegion<'a>>,
    sorted_by_carbon: &'a [String],
    best_region: &'a Option<String>,
    worst_region: &'a Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSnapshotIn {
    timestamp: DateTime<Utc>,
    ttl_minutes: i64,
    regions: serde_json::Value,
    #[serde(default)]
    sorted_by_carbon: Vec<String>,
    #[serde(default)]
    best_region: Option<String>,
    #[serde(default)]
    worst_region: Option<String>,
}

/// Errors reading or writing the snapshot file (spec.md §7: SnapshotIO,
/// SnapshotStale, SchemaSource).
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot at {path} has invalid schema: {reason}")]
    Schema {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("snapshot at {path} is stale: age exceeds its {ttl_minutes}-minute TTL")]
    Stale {
        path: std::path::PathBuf,
        ttl_minutes: i64,
    },
}

/// Write a snapshot atomically: write to a temp file in the same directory,
/// then rename over the target (spec.md §4.1, §5). Readers observe either
/// the prior snapshot or the new one, never a partial file.
pub fn write_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut wire_regions = BTreeMap::new();
    for (tag, region) in &snapshot.regions {
        wire_regions.insert(
            tag.as_str(),
            WireRegion {
                zone: &region.zone,
                carbon_intensity: region.carbon_intensity,
                datetime: region.datetime,
                updated_at: region.updated_at,
                created_at: region.created_at,
                emission_factor_type: region.emission_factor_type.as_deref(),
                is_estimated: region.is_estimated,
                estimation_method: region.estimation_method.as_deref(),
                timestamp: region.timestamp,
            },
        );
    }

    let wire = WireSnapshot {
        timestamp: snapshot.created_at,
        ttl_minutes: (snapshot.ttl.as_secs() / 60) as i64,
        regions: wire_regions,
        sorted_by_carbon: &snapshot.sorted_by_carbon,
        best_region: &snapshot.best_region,
        worst_region: &snapshot.worst_region,
    };

    let json = serde_json::to_vec_pretty(&wire).map_err(|e| SnapshotError::Schema {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("snapshot"),
        std::process::id()
    ));

    let mut file = std::fs::File::create(&tmp_path).map_err(|source| SnapshotError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    file.write_all(&json).map_err(|source| SnapshotError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    file.sync_all().map_err(|source| SnapshotError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Load and normalize a snapshot from `path`, tolerating both the flat and
/// nested `regions.regions` historical layouts. Rejects a snapshot whose
/// age exceeds its own TTL (spec.md §4.1 `load`).
pub fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let wire: WireSnapshotIn = serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Schema {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let regions_value = flatten_regions(wire.regions);
    let raw_map: BTreeMap<String, RawRegion> =
        serde_json::from_value(regions_value).map_err(|e| SnapshotError::Schema {
            path: path.to_path_buf(),
            reason: format!("regions map malformed: {e}"),
        })?;

    let mut regions = BTreeMap::new();
    for (tag, raw) in raw_map {
        let carbon_intensity = match raw.carbon_intensity {
            Some(v) if v != 0.0 => v,
            _ => match raw.moer {
                Some(v) if v > 0.0 => v,
                _ => continue, // neither field usable; drop this region
            },
        };
        if carbon_intensity <= 0.0 {
            continue;
        }
        regions.insert(
            tag.clone(),
            Region {
                zone: raw.zone.unwrap_or_else(|| tag.clone()),
                carbon_intensity,
                datetime: raw.datetime,
                updated_at: raw.updated_at,
                created_at: raw.created_at,
                emission_factor_type: raw.emission_factor_type,
                is_estimated: raw.is_estimated.unwrap_or(false),
                estimation_method: raw.estimation_method,
                timestamp: raw.timestamp,
            },
        );
    }

    let ttl = Duration::from_secs((wire.ttl_minutes.max(0) as u64) * 60);
    let sorted_by_carbon = if wire.sorted_by_carbon.is_empty() {
        let mut keys: Vec<String> = regions.keys().cloned().collect();
        keys.sort_by(|a, b| {
            regions[a]
                .carbon_intensity
                .partial_cmp(&regions[b].carbon_intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        keys
    } else {
        wire.sorted_by_carbon
    };
    let best_region = wire.best_region.or_else(|| sorted_by_carbon.first().cloned());
    let worst_region = wire.worst_region.or_else(|| sorted_by_carbon.last().cloned());

    let snapshot = Snapshot {
        created_at: wire.timestamp,
        ttl,
        regions,
        sorted_by_carbon,
        best_region,
        worst_region,
    };

    if snapshot.is_expired(Utc::now()) {
        return Err(SnapshotError::Stale {
            path: path.to_path_buf(),
            ttl_minutes: wire.ttl_minutes,
        });
    }

    Ok(snapshot)
}

/// Flatten the historical `{"regions": {"regions": {...}}}` layout down to
/// the canonical `{...}` mapping. Tolerates either shape (spec.md §6, §9).
fn flatten_regions(value: serde_json::Value) -> serde_json::Value {
    if let serde_json::Value::Object(ref map) = value {
        if let Some(nested) = map.get("regions") {
            if nested.is_object() {
                return nested.clone();
            }
        }
    }
    value
}

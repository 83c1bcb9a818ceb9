//! CIC's poll cycle and background run-loop (spec.md §4.1 "poll-once",
//! "run-loop").

use crate::cic::client::{EmissionsClient, PollError, ZoneReading};
use crate::snapshot::{self, Region, Snapshot};
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn reading_to_region(zone: &str, reading: ZoneReading) -> Region {
    let carbon_intensity = match reading.carbon_intensity {
        Some(v) if v != 0.0 => v,
        _ => reading.moer.unwrap_or(0.0),
    };
    Region {
        zone: zone.to_string(),
        carbon_intensity,
        datetime: reading.datetime.and_then(|s| s.parse().ok()),
        updated_at: reading.updated_at.and_then(|s| s.parse().ok()),
        created_at: reading.created_at.and_then(|s| s.parse().ok()),
        emission_factor_type: reading.emission_factor_type,
        is_estimated: reading.is_estimated.unwrap_or(false),
        estimation_method: reading.estimation_method,
        timestamp: reading.timestamp.and_then(|s| s.parse().ok()),
    }
}

/// Poll every zone once (spec.md §4.1). Per-zone failures are absorbed;
/// the whole cycle fails only when every zone failed.
pub async fn poll_once(zones: &[String], client: &EmissionsClient, ttl: Duration) -> Result<Snapshot, PollError> {
    let results = join_all(zones.iter().map(|zone| {
        let client = client.clone();
        let zone = zone.clone();
        async move {
            let outcome = client.latest(&zone).await;
            (zone, outcome)
        }
    }))
    .await;

    let mut regions = BTreeMap::new();
    for (zone, outcome) in results {
        match outcome {
            Ok(reading) => {
                regions.insert(zone.clone(), reading_to_region(&zone, reading));
            }
            Err(e) => warn!(zone = %zone, error = %e, "zone poll failed, skipping this cycle"),
        }
    }

    if regions.is_empty() {
        return Err(PollError::AllZonesFailed);
    }

    Ok(Snapshot::from_regions(Utc::now(), ttl, regions))
}

/// Run the poll cycle forever: immediate first poll, then sleep
/// `interval`/repeat (spec.md §4.1 "run-loop"). Only a poll that yields
/// `>= 1` region replaces the persisted snapshot; a failed poll leaves the
/// previous snapshot intact (spec.md §7).
pub async fn run_loop(
    zones: Vec<String>,
    client: EmissionsClient,
    interval: Duration,
    ttl: Duration,
    cache_file: std::path::PathBuf,
    shutdown: CancellationToken,
) {
    loop {
        match poll_once(&zones, &client, ttl).await {
            Ok(snap) => match snapshot::write_atomic(Path::new(&cache_file), &snap) {
                Ok(()) => info!(regions = snap.regions.len(), path = %cache_file.display(), "wrote carbon snapshot"),
                Err(e) => warn!(error = %e, "failed to persist snapshot, previous snapshot left intact"),
            },
            Err(e) => warn!(error = %e, "poll cycle failed, previous snapshot left intact"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("shutdown requested, stopping poll loop");
                break;
            }
        }
    }
}

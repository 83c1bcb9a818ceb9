//! Metric rollups (spec.md §4.3.4).

use crate::sim::workload::SimHost;
use serde::Serialize;
use std::collections::BTreeMap;

/// One completed unit's recorded facts, as kept by the engine for rollup at
/// the end of a run.
#[derive(Debug, Clone)]
pub struct CompletedUnit {
    pub region: String,
    pub carbon_intensity: f64,
    pub latency_secs: f64,
    pub turnaround_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub completed: u64,
    pub total_carbon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimMetrics {
    pub completed: u64,
    pub failed: u64,
    pub mean_latency_secs: f64,
    pub p95_latency_secs: f64,
    pub mean_turnaround_secs: f64,
    pub p95_turnaround_secs: f64,
    pub mean_carbon_intensity: f64,
    pub total_carbon: f64,
    pub throughput_per_hour: f64,
    pub mean_host_utilisation: f64,
    pub per_region: BTreeMap<String, RegionStats>,
}

fn percentile(mut values: Vec<f64>, p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = (p * (values.len() as f64 - 1.0)).round() as usize;
    values[rank.min(values.len() - 1)]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Roll up per-unit records into the final run report (spec.md §4.3.4).
/// `utilisation_samples` is the per-tick snapshot of every host's
/// utilisation, averaged here into a single scalar.
pub fn compute_metrics(
    completed: &[CompletedUnit],
    failed: u64,
    duration_hours: f64,
    utilisation_samples: &[f64],
) -> SimMetrics {
    let latencies: Vec<f64> = completed.iter().map(|u| u.latency_secs).collect();
    let turnarounds: Vec<f64> = completed.iter().map(|u| u.turnaround_secs).collect();
    let carbons: Vec<f64> = completed.iter().map(|u| u.carbon_intensity).collect();

    let mut per_region: BTreeMap<String, RegionStats> = BTreeMap::new();
    for unit in completed {
        let entry = per_region.entry(unit.region.clone()).or_insert(RegionStats {
            completed: 0,
            total_carbon: 0.0,
        });
        entry.completed += 1;
        entry.total_carbon += unit.carbon_intensity;
    }

    SimMetrics {
        completed: completed.len() as u64,
        failed,
        mean_latency_secs: mean(&latencies),
        p95_latency_secs: percentile(latencies, 0.95),
        mean_turnaround_secs: mean(&turnarounds),
        p95_turnaround_secs: percentile(turnarounds, 0.95),
        mean_carbon_intensity: mean(&carbons),
        total_carbon: carbons.iter().sum(),
        throughput_per_hour: if duration_hours > 0.0 {
            completed.len() as f64 / duration_hours
        } else {
            0.0
        },
        mean_host_utilisation: mean(utilisation_samples),
        per_region,
    }
}

/// Carbon reduction of `other` relative to a highest-carbon baseline run
/// (spec.md §4.3.4): `(other − carbon_aware) / other × 100`, here named by
/// its arguments rather than by policy to keep the formula reusable for any
/// pair of comparable runs.
pub fn carbon_reduction_pct(baseline_total_carbon: f64, candidate_total_carbon: f64) -> f64 {
    if baseline_total_carbon == 0.0 {
        return 0.0;
    }
    (baseline_total_carbon - candidate_total_carbon) / baseline_total_carbon * 100.0
}

pub fn utilisation_snapshot(hosts: &[SimHost]) -> f64 {
    mean(&hosts.iter().map(SimHost::utilisation).collect::<Vec<_>>())
}

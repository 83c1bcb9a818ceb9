//! End-to-end exercise of the public API: a snapshot on disk, a demo
//! platform document on disk, and a full placement decision through
//! `PlacementEngine` (spec.md §8).

use cawp::cape::{CarbonAwarePolicy, DemoPlatform, FileSnapshotSource, PlacementEngine};
use cawp::sim::{compare_policies, PolicyKind, SimConfig, SimRun};
use cawp::snapshot;
use std::io::Write;

fn fixture_snapshot_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_snapshot.json")
}

#[test]
fn fixture_snapshot_loads_with_expected_ordering() {
    let snap = snapshot::load(&fixture_snapshot_path()).expect("fixture snapshot should load");
    assert_eq!(snap.best_region.as_deref(), Some("FR"));
    assert_eq!(snap.worst_region.as_deref(), Some("IN-KA"));
    assert_eq!(snap.sorted_by_carbon, vec!["FR", "US-NY-NYIS", "IN-KA"]);
    assert_eq!(snap.regions.len(), 3);
}

fn write_demo_doc(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn engine_binds_unit_to_lowest_carbon_admissible_host() {
    let doc = write_demo_doc(
        r#"{
            "hosts": [
                {"name": "ny", "labels": {"carbon-region": "US-NY-NYIS"}, "capacity": {"cpu": 4}},
                {"name": "fr", "labels": {"carbon-region": "FR"}, "capacity": {"cpu": 4}},
                {"name": "ka", "labels": {"carbon-region": "IN-KA"}, "capacity": {"cpu": 4}}
            ],
            "units": [
                {"id": "job-1", "scheduler_name": "cape", "request": {"cpu": 1}}
            ]
        }"#,
    );
    let platform = DemoPlatform::load(doc.path()).unwrap();
    let snapshot_source = FileSnapshotSource::new(fixture_snapshot_path());
    let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, "cape");

    let decision = engine
        .handle(&cawp::cape::UnitRef {
            id: "job-1".to_string(),
            namespace: "default".to_string(),
        })
        .await;

    assert_eq!(
        decision,
        cawp::cape::engine::Decision::Bound { host: "fr".to_string() }
    );
}

#[tokio::test]
async fn engine_ignores_unit_for_a_different_scheduler() {
    let doc = write_demo_doc(
        r#"{
            "hosts": [{"name": "fr", "labels": {"carbon-region": "FR"}, "capacity": {"cpu": 4}}],
            "units": [{"id": "job-1", "scheduler_name": "someone-else", "request": {"cpu": 1}}]
        }"#,
    );
    let platform = DemoPlatform::load(doc.path()).unwrap();
    let snapshot_source = FileSnapshotSource::new(fixture_snapshot_path());
    let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, "cape");

    let decision = engine
        .handle(&cawp::cape::UnitRef {
            id: "job-1".to_string(),
            namespace: "default".to_string(),
        })
        .await;

    assert_eq!(decision, cawp::cape::engine::Decision::IgnoredForeign);
}

#[test]
fn simulator_is_deterministic_given_fixed_seed() {
    let snap = snapshot::load(&fixture_snapshot_path()).unwrap();
    let run_once = |seed| {
        let config = SimConfig::new(0.5, 10.0, 0.5, PolicyKind::CarbonAware, seed);
        SimRun::new(&snap, config).run()
    };
    let a = run_once(99);
    let b = run_once(99);
    assert_eq!(a.completed, b.completed);
    assert_eq!(a.total_carbon, b.total_carbon);
    assert_eq!(a.per_region, b.per_region);
}

#[test]
fn comparison_report_ranks_carbon_aware_at_or_below_highest_carbon() {
    let snap = snapshot::load(&fixture_snapshot_path()).unwrap();
    let base = SimConfig::new(0.5, 12.0, 0.5, PolicyKind::CarbonAware, 123);
    let report = compare_policies(&snap, &base, &PolicyKind::ALL);

    let carbon_aware = report.entries.iter().find(|e| e.policy == "carbon-aware").unwrap();
    let highest_carbon = report.entries.iter().find(|e| e.policy == "highest-carbon").unwrap();

    assert_eq!(highest_carbon.carbon_reduction_vs_highest_carbon_pct, 0.0);
    assert!(carbon_aware.metrics.mean_carbon_intensity <= highest_carbon.metrics.mean_carbon_intensity);
}

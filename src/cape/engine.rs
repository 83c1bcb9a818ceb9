//! The placement engine's observation loop (spec.md §4.2.5).

use crate::cape::admission::{admissible_hosts, compute_allocated};
use crate::cape::platform::{PlatformError, PlatformFacade, UnitRef};
use crate::cape::scoring::{select_best, Policy, ScoringContext};
use crate::cape::snapshot_source::SnapshotSource;
use crate::host::Host;
use crate::workload::WorkloadUnit;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// What the engine did with one observed unit, for tests and callers that
/// want to assert on outcomes rather than log lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Bound { host: String },
    Skipped { reason: String },
    IgnoredForeign,
}

/// Generic over the three capabilities the engine depends on (spec.md §9):
/// the platform it binds against, where it reads carbon data from, and the
/// rule it scores hosts with.
pub struct PlacementEngine<F, S, P>
where
    F: PlatformFacade,
    S: SnapshotSource,
    P: Policy,
{
    platform: F,
    snapshot_source: S,
    policy: P,
    scheduler_name: String,
}

impl<F, S, P> PlacementEngine<F, S, P>
where
    F: PlatformFacade,
    S: SnapshotSource,
    P: Policy,
{
    pub fn new(platform: F, snapshot_source: S, policy: P, scheduler_name: impl Into<String>) -> Self {
        Self {
            platform,
            snapshot_source,
            policy,
            scheduler_name: scheduler_name.into(),
        }
    }

    /// Consume the platform's unplaced-unit stream until it ends (spec.md
    /// §4.2.5). In production this stream never ends; tests drive a finite
    /// one.
    pub async fn run(&self) {
        let mut stream = self.platform.watch_unplaced();
        while let Some(unit_ref) = stream.next().await {
            let decision = self.handle(&unit_ref).await;
            debug!(unit = %unit_ref.id, namespace = %unit_ref.namespace, decision = ?decision, "observed unit");
        }
    }

    /// Process one observed unit reference through filter, score, and bind
    /// (spec.md §4.2.1-§4.2.4). Public so tests can drive single units
    /// without constructing a stream.
    pub async fn handle(&self, unit_ref: &UnitRef) -> Decision {
        let unit = match self.platform.resolve(unit_ref).await {
            Ok(unit) => unit,
            Err(PlatformError::UnitNotFound(_)) => {
                return Decision::Skipped {
                    reason: "unit vanished before resolve".to_string(),
                };
            }
            Err(e) => {
                return Decision::Skipped {
                    reason: format!("resolve failed: {e}"),
                };
            }
        };

        if !unit.is_owned_by(&self.scheduler_name) {
            return Decision::IgnoredForeign;
        }

        let hosts = match self.platform.list_hosts().await {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!(error = %e, "failed to list hosts, skipping unit this cycle");
                return Decision::Skipped {
                    reason: format!("list_hosts failed: {e}"),
                };
            }
        };

        let hosts_with_allocated = match self.resolve_allocated(hosts).await {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!(error = %e, "failed to compute allocated resources, skipping unit this cycle");
                return Decision::Skipped {
                    reason: format!("allocation lookup failed: {e}"),
                };
            }
        };

        let admissible = admissible_hosts(&hosts_with_allocated, &unit);
        if admissible.is_empty() {
            info!(unit = %unit.id, "no admissible host, skipping this cycle");
            return Decision::Skipped {
                reason: "no admissible host".to_string(),
            };
        }

        let snapshot = match self.snapshot_source.load() {
            Ok(snap) => Some(snap),
            Err(e) => {
                warn!(error = %e, "snapshot unavailable, falling back to baseline for this decision");
                None
            }
        };
        let ctx = ScoringContext {
            snapshot: snapshot.as_ref(),
        };

        let scores: Vec<(&str, f64)> = admissible
            .iter()
            .map(|h| (h.name.as_str(), self.policy.score(h, &ctx)))
            .collect();
        debug!(unit = %unit.id, ?scores, "scored admissible hosts");

        let Some((winner, score)) = select_best(&admissible, &self.policy, &ctx) else {
            return Decision::Skipped {
                reason: "no admissible host".to_string(),
            };
        };

        match self.platform.bind(unit_ref, &winner.name).await {
            Ok(()) => {
                info!(unit = %unit.id, host = %winner.name, score, "bound unit");
                Decision::Bound {
                    host: winner.name.clone(),
                }
            }
            Err(e) => {
                warn!(error = %e, unit = %unit.id, host = %winner.name, "bind failed, leaving unit unbound for next cycle");
                Decision::Skipped {
                    reason: format!("bind failed: {e}"),
                }
            }
        }
    }

    /// Fill in each host's `allocated` vector from currently live units
    /// (spec.md §3 "Host"). Hosts the facade reports with capacity already
    /// populated are used as-is; `allocated` is always recomputed here since
    /// it changes on every bind.
    async fn resolve_allocated(&self, hosts: Vec<Host>) -> Result<Vec<Host>, PlatformError> {
        let mut out = Vec::with_capacity(hosts.len());
        for mut host in hosts {
            let units = self.platform.list_units_on(&host.name).await?;
            host.allocated = compute_allocated(&units);
            out.push(host);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cape::scoring::{BaselinePolicy, CarbonAwarePolicy};
    use crate::cape::snapshot_source::FixedSnapshotSource;
    use crate::host::REFUSE_PLACEMENT_EFFECT;
    use crate::snapshot::{Region, Snapshot};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakePlatform {
        units: Mutex<BTreeMap<String, WorkloadUnit>>,
        hosts: Vec<Host>,
        binds: Mutex<Vec<(String, String)>>,
        refs: Vec<UnitRef>,
    }

    #[async_trait]
    impl PlatformFacade for FakePlatform {
        fn watch_unplaced(&self) -> BoxStream<'static, UnitRef> {
            stream::iter(self.refs.clone()).boxed()
        }

        async fn resolve(&self, unit: &UnitRef) -> Result<WorkloadUnit, PlatformError> {
            self.units
                .lock()
                .unwrap()
                .get(&unit.id)
                .cloned()
                .ok_or_else(|| PlatformError::UnitNotFound(unit.clone()))
        }

        async fn list_units_on(&self, _host: &str) -> Result<Vec<WorkloadUnit>, PlatformError> {
            Ok(vec![])
        }

        async fn list_hosts(&self) -> Result<Vec<Host>, PlatformError> {
            Ok(self.hosts.clone())
        }

        async fn bind(&self, unit: &UnitRef, host: &str) -> Result<(), PlatformError> {
            self.binds.lock().unwrap().push((unit.id.clone(), host.to_string()));
            Ok(())
        }
    }

    fn unit_ref(id: &str) -> UnitRef {
        UnitRef {
            id: id.to_string(),
            namespace: "default".to_string(),
        }
    }

    fn snapshot_with(pairs: &[(&str, f64)]) -> Snapshot {
        let mut regions = BTreeMap::new();
        for (tag, intensity) in pairs {
            regions.insert(
                tag.to_string(),
                Region {
                    zone: tag.to_string(),
                    carbon_intensity: *intensity,
                    datetime: None,
                    updated_at: None,
                    created_at: None,
                    emission_factor_type: None,
                    is_estimated: false,
                    estimation_method: None,
                    timestamp: None,
                },
            );
        }
        Snapshot::from_regions(chrono::Utc::now(), Duration::from_secs(600), regions)
    }

    #[tokio::test]
    async fn binds_to_lower_carbon_region() {
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 1);
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![
                Host::new("h1").with_label("carbon-region", "A").with_capacity("cpu", 10),
                Host::new("h2").with_label("carbon-region", "B").with_capacity("cpu", 10),
            ],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Ok(snapshot_with(&[("A", 334.0), ("B", 500.0)]))),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::Bound { host: "h1".to_string() });
    }

    #[tokio::test]
    async fn falls_back_to_baseline_when_best_host_is_full() {
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 10);
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![
                Host::new("h1").with_label("carbon-region", "A").with_capacity("cpu", 1),
                Host::new("h2").with_label("carbon-region", "B").with_capacity("cpu", 10),
            ],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Ok(snapshot_with(&[("A", 334.0), ("B", 500.0)]))),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::Bound { host: "h2".to_string() });
    }

    #[tokio::test]
    async fn missing_region_label_still_admits_via_sentinel() {
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 1);
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![
                Host::new("h1").with_label("carbon-region", "A").with_capacity("cpu", 10),
                Host::new("h2").with_capacity("cpu", 10),
            ],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Ok(snapshot_with(&[("A", 900.0)]))),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::Bound { host: "h1".to_string() });
    }

    #[tokio::test]
    async fn stale_snapshot_falls_back_to_baseline_first_admissible() {
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 1);
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![
                Host::new("h1").with_capacity("cpu", 10),
                Host::new("h2").with_capacity("cpu", 10),
            ],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Err("snapshot expired".to_string())),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, BaselinePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::Bound { host: "h1".to_string() });
    }

    #[tokio::test]
    async fn foreign_scheduler_name_is_ignored() {
        let unit = WorkloadUnit::new("u1", "default", "other-scheduler");
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![Host::new("h1").with_capacity("cpu", 10)],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Ok(snapshot_with(&[]))),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, BaselinePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::IgnoredForeign);
    }

    #[tokio::test]
    async fn refuse_placement_taint_excludes_host_from_admission() {
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 1);
        let mut units = BTreeMap::new();
        units.insert("u1".to_string(), unit);
        let platform = FakePlatform {
            units: Mutex::new(units),
            hosts: vec![
                Host::new("h1").with_capacity("cpu", 10).with_taint("k", "v", REFUSE_PLACEMENT_EFFECT),
                Host::new("h2").with_capacity("cpu", 10),
            ],
            binds: Mutex::new(vec![]),
            refs: vec![unit_ref("u1")],
        };
        let snapshot_source = FixedSnapshotSource {
            result: Mutex::new(Ok(snapshot_with(&[]))),
        };
        let engine = PlacementEngine::new(platform, snapshot_source, BaselinePolicy, "cape");
        let decision = engine.handle(&unit_ref("u1")).await;
        assert_eq!(decision, Decision::Bound { host: "h2".to_string() });
    }
}

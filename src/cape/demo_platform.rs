//! A file-backed [`PlatformFacade`] for running CAPE standalone, without a
//! real orchestration platform wired in (spec.md §1: the platform's
//! watch/bind API is out of scope; this is a demo harness for the binary,
//! not a production implementation).
//!
//! State is a single JSON document: a list of hosts and a list of units.
//! `watch_unplaced` yields every unit that starts `Unbound`, once, at
//! startup — enough to exercise the admission/scoring/bind pipeline
//! end-to-end without a live cluster.

use crate::cape::platform::{PlatformError, PlatformFacade, UnitRef};
use crate::host::Host;
use crate::workload::{UnitLifecycle, WorkloadUnit};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Deserialize)]
struct DemoDocument {
    hosts: Vec<DemoHost>,
    units: Vec<DemoUnit>,
}

#[derive(Debug, Deserialize)]
struct DemoHost {
    name: String,
    #[serde(default = "default_ready")]
    ready: bool,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    capacity: HashMap<String, i64>,
}

fn default_ready() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DemoUnit {
    id: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    scheduler_name: String,
    #[serde(default)]
    request: HashMap<String, i64>,
}

fn default_namespace() -> String {
    "default".to_string()
}

pub struct DemoPlatform {
    hosts: Vec<Host>,
    units: Mutex<HashMap<String, WorkloadUnit>>,
    /// Host each live unit is currently bound to, for `list_units_on`.
    bindings: AsyncMutex<HashMap<String, String>>,
    unplaced: Vec<UnitRef>,
}

impl DemoPlatform {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let doc: DemoDocument = serde_json::from_slice(&bytes)?;

        let hosts: Vec<Host> = doc
            .hosts
            .into_iter()
            .map(|h| {
                let mut host = Host::new(h.name).with_ready(h.ready);
                for (k, v) in h.labels {
                    host = host.with_label(k, v);
                }
                for (dim, qty) in h.capacity {
                    host = host.with_capacity(dim, qty);
                }
                host
            })
            .collect();

        let mut units = HashMap::new();
        let mut unplaced = Vec::new();
        for u in doc.units {
            let mut unit = WorkloadUnit::new(u.id.clone(), u.namespace.clone(), u.scheduler_name);
            for (dim, qty) in u.request {
                unit = unit.with_request(dim, qty);
            }
            unplaced.push(UnitRef {
                id: u.id.clone(),
                namespace: u.namespace,
            });
            units.insert(u.id, unit);
        }

        Ok(Self {
            hosts,
            units: Mutex::new(units),
            bindings: AsyncMutex::new(HashMap::new()),
            unplaced,
        })
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.name.clone()).collect()
    }
}

#[async_trait]
impl PlatformFacade for DemoPlatform {
    fn watch_unplaced(&self) -> BoxStream<'static, UnitRef> {
        stream::iter(self.unplaced.clone()).boxed()
    }

    async fn resolve(&self, unit: &UnitRef) -> Result<WorkloadUnit, PlatformError> {
        self.units
            .lock()
            .unwrap()
            .get(&unit.id)
            .cloned()
            .ok_or_else(|| PlatformError::UnitNotFound(unit.clone()))
    }

    async fn list_units_on(&self, host: &str) -> Result<Vec<WorkloadUnit>, PlatformError> {
        let bindings = self.bindings.lock().await;
        let units = self.units.lock().unwrap();
        Ok(bindings
            .iter()
            .filter(|(_, h)| h.as_str() == host)
            .filter_map(|(unit_id, _)| units.get(unit_id).cloned())
            .collect())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, PlatformError> {
        Ok(self.hosts.clone())
    }

    async fn bind(&self, unit: &UnitRef, host: &str) -> Result<(), PlatformError> {
        let host_exists = self.hosts.iter().any(|h| h.name == host);
        if !host_exists {
            return Err(PlatformError::BindConflict {
                unit: unit.clone(),
                host: host.to_string(),
                reason: "unknown host".to_string(),
            });
        }
        self.bindings.lock().await.insert(unit.id.clone(), host.to_string());
        if let Some(u) = self.units.lock().unwrap().get_mut(&unit.id) {
            u.host = Some(host.to_string());
            u.lifecycle = UnitLifecycle::Bound;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_doc(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_hosts_and_units_and_binds() {
        let file = write_doc(
            r#"{
                "hosts": [
                    {"name": "h1", "labels": {"carbon-region": "A"}, "capacity": {"cpu": 4}},
                    {"name": "h2", "labels": {"carbon-region": "B"}, "capacity": {"cpu": 4}}
                ],
                "units": [
                    {"id": "u1", "scheduler_name": "cape", "request": {"cpu": 1}}
                ]
            }"#,
        );
        let platform = DemoPlatform::load(file.path()).unwrap();
        assert_eq!(platform.host_names(), vec!["h1", "h2"]);

        let unit_ref = UnitRef {
            id: "u1".to_string(),
            namespace: "default".to_string(),
        };
        let unit = platform.resolve(&unit_ref).await.unwrap();
        assert_eq!(unit.scheduler_name, "cape");

        platform.bind(&unit_ref, "h1").await.unwrap();
        let bound = platform.list_units_on("h1").await.unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].id, "u1");
    }

    #[tokio::test]
    async fn bind_to_unknown_host_is_conflict() {
        let file = write_doc(r#"{"hosts": [], "units": [{"id": "u1", "scheduler_name": "cape"}]}"#);
        let platform = DemoPlatform::load(file.path()).unwrap();
        let unit_ref = UnitRef {
            id: "u1".to_string(),
            namespace: "default".to_string(),
        };
        let err = platform.bind(&unit_ref, "ghost").await.unwrap_err();
        assert!(matches!(err, PlatformError::BindConflict { .. }));
    }
}

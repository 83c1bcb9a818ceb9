//! CAWP: carbon-aware workload placement core.
//!
//! Three independent subsystems sharing one data contract — a JSON
//! snapshot of regional carbon intensity:
//!
//! - [`cic`]: polls an external emissions service and persists the
//!   snapshot atomically.
//! - [`cape`]: watches for unbound workload units and binds them to the
//!   lowest-carbon admissible host.
//! - [`sim`]: drives synthetic workloads through the same filter/scoring
//!   contracts CAPE uses, to compare placement policies offline.
//!
//! CIC and CAPE share only the snapshot file; there is no other coupling.

pub mod config;
pub mod host;
pub mod snapshot;
pub mod workload;

pub mod cape;
pub mod cic;
pub mod sim;

pub use host::{Host, ResourceVector, Taint};
pub use snapshot::{Region, Snapshot, SnapshotError};
pub use workload::{UnitLifecycle, WorkloadUnit};

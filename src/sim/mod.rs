//! Placement Simulator (spec.md §4.3): a discrete-event harness that drives
//! synthetic workloads through the same filter/scoring contracts CAPE uses,
//! to compare placement policies offline.

pub mod compare;
pub mod config;
pub mod engine;
pub mod event;
pub mod metrics;
pub mod policies;
pub mod workload;

pub use compare::{compare_policies, ComparisonEntry, ComparisonReport};
pub use config::{PolicyKind, SimConfig, UnitKind};
pub use engine::SimRun;
pub use metrics::SimMetrics;

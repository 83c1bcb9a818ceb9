//! Carbon-Aware Placement Engine (spec.md §4.2).
//!
//! Watches for unbound workload units, computes the admissible host set,
//! scores it under the configured [`Policy`], and binds the winner — one
//! unit at a time, no batching, no internal retry queue (spec.md §4.2.5,
//! §9).

pub mod admission;
pub mod demo_platform;
pub mod engine;
pub mod platform;
pub mod scoring;
pub mod snapshot_source;

pub use demo_platform::DemoPlatform;
pub use engine::PlacementEngine;
pub use platform::{HostRef, PlatformError, PlatformFacade, UnitRef};
pub use scoring::{BaselinePolicy, CarbonAwarePolicy, Policy, ScoringContext};
pub use snapshot_source::{FileSnapshotSource, SnapshotSource};

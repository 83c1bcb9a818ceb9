//! The platform's watch/bind primitives, re-expressed as a capability
//! (spec.md §9 "Platform client as global").
//!
//! The real implementation is supplied by the orchestration platform this
//! engine runs inside — out of scope here (spec.md §1). What belongs to
//! this core is the seam: a trait the engine is generic over, so tests and
//! the simulator can supply synthetic implementations.

use crate::host::Host;
use crate::workload::WorkloadUnit;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A reference to a unit, as carried by a platform notification (spec.md
/// §4.2.5). Cheap to clone; the facade resolves it to a full
/// [`WorkloadUnit`] on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitRef {
    pub id: String,
    pub namespace: String,
}

/// A reference to a host, as returned by [`PlatformFacade::list_hosts`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostRef {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unit {0:?} not found")]
    UnitNotFound(UnitRef),
    #[error("bind conflict for unit {unit:?} on host {host}: {reason}")]
    BindConflict {
        unit: UnitRef,
        host: String,
        reason: String,
    },
}

/// The platform capability CAPE is generic over (spec.md §9). A production
/// implementation wraps the orchestration platform's real watch/bind API;
/// the simulator supplies a synthetic one over its in-memory host/unit
/// graph.
#[async_trait]
pub trait PlatformFacade: Send + Sync {
    /// A live stream of "unit without assigned host" notifications. On
    /// startup the stream must yield a full enumeration of currently-unbound
    /// units before the engine is considered healthy (spec.md §4.2.5).
    fn watch_unplaced(&self) -> BoxStream<'static, UnitRef>;

    /// Resolve a reference to its full unit record.
    async fn resolve(&self, unit: &UnitRef) -> Result<WorkloadUnit, PlatformError>;

    /// Every live (non-terminal) unit currently bound to `host`, used to
    /// compute allocated resources (spec.md §3 "Host").
    async fn list_units_on(&self, host: &str) -> Result<Vec<WorkloadUnit>, PlatformError>;

    /// Every known execution candidate.
    async fn list_hosts(&self) -> Result<Vec<Host>, PlatformError>;

    /// Commit a placement. Failure is non-fatal to the engine (spec.md
    /// §4.2.3, §7 BindConflict): the caller logs and moves on.
    async fn bind(&self, unit: &UnitRef, host: &str) -> Result<(), PlatformError>;
}

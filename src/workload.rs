//! Units of placement (spec.md §3 "WorkloadUnit").

use crate::host::ResourceVector;

/// Lifecycle state of a unit as CAPE observes it (spec.md §3, §4.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitLifecycle {
    Unbound,
    Bound,
    Terminal,
}

#[derive(Debug, Clone)]
pub struct WorkloadUnit {
    pub id: String,
    pub namespace: String,
    /// The scheduler name this unit declares. Units whose value does not
    /// match the engine's configured name are ignored entirely (spec.md §6).
    pub scheduler_name: String,
    /// Optional declared region affinity (spec.md §3). Unused by the
    /// admission filter or scoring in this core — carried for forward
    /// compatibility with a future affinity predicate.
    pub region_affinity: Option<String>,
    pub request: ResourceVector,
    pub lifecycle: UnitLifecycle,
    pub host: Option<String>,
}

impl WorkloadUnit {
    pub fn new(id: impl Into<String>, namespace: impl Into<String>, scheduler_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            scheduler_name: scheduler_name.into(),
            region_affinity: None,
            request: ResourceVector::new(),
            lifecycle: UnitLifecycle::Unbound,
            host: None,
        }
    }

    pub fn with_request(mut self, dim: impl Into<String>, qty: i64) -> Self {
        self.request.insert(dim.into(), qty);
        self
    }

    /// Whether this unit is owned by the engine configured with `name`.
    pub fn is_owned_by(&self, name: &str) -> bool {
        self.scheduler_name == name
    }
}

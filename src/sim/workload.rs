//! Synthetic hosts and units for SIM's in-memory graph (spec.md §4.3.1).
//!
//! Distinct from [`crate::host::Host`] / [`crate::workload::WorkloadUnit`]:
//! those model the real platform's contract, these carry the extra
//! bookkeeping (queues, timestamps) the simulator's event loop needs and
//! that a real platform implementation tracks for us.

use crate::sim::config::UnitKind;

#[derive(Debug, Clone)]
pub struct SimHost {
    pub region: String,
    pub carbon_intensity: f64,
    pub compute_capacity: i64,
    pub memory_capacity: i64,
    pub compute_allocated: i64,
    pub memory_allocated: i64,
    /// Units waiting for capacity on this host specifically, in arrival
    /// order (spec.md §4.3.2 "queue of a preferred host").
    pub queue: Vec<UnitId>,
    pub bound_count: u64,
}

impl SimHost {
    pub fn new(region: impl Into<String>, carbon_intensity: f64, compute_capacity: i64, memory_capacity: i64) -> Self {
        Self {
            region: region.into(),
            carbon_intensity,
            compute_capacity,
            memory_capacity,
            compute_allocated: 0,
            memory_allocated: 0,
            queue: Vec::new(),
            bound_count: 0,
        }
    }

    pub fn fits(&self, cpu: i64, mem: i64) -> bool {
        self.compute_capacity - self.compute_allocated >= cpu && self.memory_capacity - self.memory_allocated >= mem
    }

    pub fn utilisation(&self) -> f64 {
        if self.compute_capacity == 0 {
            return 0.0;
        }
        self.compute_allocated as f64 / self.compute_capacity as f64
    }
}

pub type UnitId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Queued,
    Started,
    Completed,
}

#[derive(Debug, Clone)]
pub struct SimUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub cpu_request: i64,
    pub mem_request: i64,
    pub duration_secs: f64,
    pub created_at: f64,
    pub started_at: Option<f64>,
    pub completed_at: Option<f64>,
    pub host: Option<usize>,
    pub state: UnitState,
}

impl SimUnit {
    /// Wall-clock duration during which resources are actually held, given
    /// the unit kind's blocking fraction (spec.md §4.3.1).
    pub fn held_duration_secs(&self) -> f64 {
        self.duration_secs * self.kind.blocking_fraction()
    }
}

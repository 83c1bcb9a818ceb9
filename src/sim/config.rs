//! Simulation configuration (spec.md §4.3.1).

use crate::config::defaults::{
    BLOCKING_FRACTION_BATCH, BLOCKING_FRACTION_COMPUTE_INTENSIVE, BLOCKING_FRACTION_IO_BOUND,
    BLOCKING_FRACTION_MIXED, SYNTH_HOST_COMPUTE_UNITS, SYNTH_HOST_MEMORY_UNITS,
};

/// The four unit kinds SIM generates, each with its own duration,
/// resource-request, and blocking-fraction profile (spec.md §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    ComputeIntensive,
    Batch,
    IoBound,
    Mixed,
}

impl UnitKind {
    pub const ALL: [UnitKind; 4] = [
        UnitKind::ComputeIntensive,
        UnitKind::Batch,
        UnitKind::IoBound,
        UnitKind::Mixed,
    ];

    /// Fraction of a unit's duration during which its resource request is
    /// held against host capacity (spec.md §4.3.1).
    pub fn blocking_fraction(self) -> f64 {
        match self {
            UnitKind::ComputeIntensive => BLOCKING_FRACTION_COMPUTE_INTENSIVE,
            UnitKind::Batch => BLOCKING_FRACTION_BATCH,
            UnitKind::IoBound => BLOCKING_FRACTION_IO_BOUND,
            UnitKind::Mixed => BLOCKING_FRACTION_MIXED,
        }
    }

    /// Mean, standard deviation of the unit's duration in seconds, drawn
    /// from a truncated normal (spec.md §4.3.1). Chosen so compute/batch
    /// jobs run longer than I/O-bound ones, reflecting typical workload
    /// shapes.
    pub fn duration_secs_mean_std(self) -> (f64, f64) {
        match self {
            UnitKind::ComputeIntensive => (1800.0, 600.0),
            UnitKind::Batch => (3600.0, 1200.0),
            UnitKind::IoBound => (300.0, 120.0),
            UnitKind::Mixed => (900.0, 400.0),
        }
    }

    /// Mean, standard deviation of the unit's cpu-unit request.
    pub fn cpu_request_mean_std(self) -> (f64, f64) {
        match self {
            UnitKind::ComputeIntensive => (3.0, 0.5),
            UnitKind::Batch => (2.0, 0.5),
            UnitKind::IoBound => (1.0, 0.25),
            UnitKind::Mixed => (1.5, 0.5),
        }
    }

    /// Mean, standard deviation of the unit's memory-unit request.
    pub fn mem_request_mean_std(self) -> (f64, f64) {
        match self {
            UnitKind::ComputeIntensive => (2.0, 0.5),
            UnitKind::Batch => (4.0, 1.0),
            UnitKind::IoBound => (1.0, 0.25),
            UnitKind::Mixed => (2.0, 0.5),
        }
    }
}

/// The five mandatory placement policies (spec.md §4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    CarbonAware,
    HighestCarbon,
    RoundRobin,
    Random,
    LeastLoaded,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::CarbonAware,
        PolicyKind::HighestCarbon,
        PolicyKind::RoundRobin,
        PolicyKind::Random,
        PolicyKind::LeastLoaded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::CarbonAware => "carbon-aware",
            PolicyKind::HighestCarbon => "highest-carbon",
            PolicyKind::RoundRobin => "round-robin",
            PolicyKind::Random => "random",
            PolicyKind::LeastLoaded => "least-loaded",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "carbon-aware" => Some(PolicyKind::CarbonAware),
            "highest-carbon" => Some(PolicyKind::HighestCarbon),
            "round-robin" => Some(PolicyKind::RoundRobin),
            "random" => Some(PolicyKind::Random),
            "least-loaded" => Some(PolicyKind::LeastLoaded),
            _ => None,
        }
    }
}

/// Full run configuration (spec.md §4.3.1).
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub duration_hours: f64,
    pub arrivals_per_minute: f64,
    /// Fraction of arrivals that are `ComputeIntensive`; the remainder
    /// splits evenly across `Batch`, `IoBound`, `Mixed`.
    pub compute_job_ratio: f64,
    pub policy: PolicyKind,
    pub seed: u64,
    pub host_compute_units: i64,
    pub host_memory_units: i64,
}

impl SimConfig {
    pub fn new(duration_hours: f64, arrivals_per_minute: f64, compute_job_ratio: f64, policy: PolicyKind, seed: u64) -> Self {
        Self {
            duration_hours,
            arrivals_per_minute,
            compute_job_ratio,
            policy,
            seed,
            host_compute_units: SYNTH_HOST_COMPUTE_UNITS,
            host_memory_units: SYNTH_HOST_MEMORY_UNITS,
        }
    }

    /// Draw a unit kind given a uniform `[0, 1)` sample `u`
    /// (spec.md §4.3.1: compute_job_ratio controls the compute-intensive
    /// share; the rest splits evenly three ways).
    pub fn kind_for_sample(&self, u: f64) -> UnitKind {
        let remainder = (1.0 - self.compute_job_ratio).max(0.0);
        let third = remainder / 3.0;
        if u < self.compute_job_ratio {
            UnitKind::ComputeIntensive
        } else if u < self.compute_job_ratio + third {
            UnitKind::Batch
        } else if u < self.compute_job_ratio + 2.0 * third {
            UnitKind::IoBound
        } else {
            UnitKind::Mixed
        }
    }
}

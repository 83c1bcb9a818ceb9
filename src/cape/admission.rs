//! Admission filter (spec.md §4.2.1).

use crate::host::{Host, ResourceVector};
use crate::workload::WorkloadUnit;

/// Reason a host was rejected, for structured logging (spec.md §7's
/// AdmissionEmpty is a scheduling decision, not an error — this is the
/// diagnostic behind that decision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotReady,
    RefusePlacementTaint,
    InsufficientResources,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotReady => write!(f, "not ready"),
            RejectReason::RefusePlacementTaint => write!(f, "refuse-placement taint"),
            RejectReason::InsufficientResources => write!(f, "insufficient resources"),
        }
    }
}

/// Sum of every live unit's declared request, excluding terminating units,
/// already reflected in `host.allocated` — see [`compute_allocated`] for
/// building that vector from a unit list.
pub fn compute_allocated<'a>(units: impl IntoIterator<Item = &'a WorkloadUnit>) -> ResourceVector {
    let mut allocated = ResourceVector::new();
    for unit in units {
        for (dim, qty) in &unit.request {
            *allocated.entry(dim.clone()).or_insert(0) += qty;
        }
    }
    allocated
}

/// Whether `host` is admissible for `unit` (spec.md §4.2.1). Returns the
/// rejection reason on failure for logging.
pub fn admits(host: &Host, unit: &WorkloadUnit) -> Result<(), RejectReason> {
    if !host.ready {
        return Err(RejectReason::NotReady);
    }
    if host.has_refuse_placement_taint() {
        return Err(RejectReason::RefusePlacementTaint);
    }
    if !host.fits(&unit.request) {
        return Err(RejectReason::InsufficientResources);
    }
    Ok(())
}

/// Filter `hosts` down to those admissible for `unit`, preserving
/// iteration order (needed for the "first admissible" baseline policy and
/// first-seen tie-breaking in scoring).
pub fn admissible_hosts<'a>(hosts: &'a [Host], unit: &WorkloadUnit) -> Vec<&'a Host> {
    hosts.iter().filter(|h| admits(h, unit).is_ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::REFUSE_PLACEMENT_EFFECT;

    fn spacious_host(name: &str) -> Host {
        Host::new(name).with_capacity("cpu", 4000).with_capacity("mem", 8_000_000_000)
    }

    #[test]
    fn empty_request_admissible_on_ready_untainted_host() {
        let host = spacious_host("h1");
        let unit = WorkloadUnit::new("u1", "default", "cape");
        assert!(admits(&host, &unit).is_ok());
    }

    #[test]
    fn not_ready_rejected() {
        let mut host = spacious_host("h1");
        host.ready = false;
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 100);
        assert_eq!(admits(&host, &unit), Err(RejectReason::NotReady));
    }

    #[test]
    fn refuse_placement_taint_rejected() {
        let host = spacious_host("h1").with_taint("k", "v", REFUSE_PLACEMENT_EFFECT);
        let unit = WorkloadUnit::new("u1", "default", "cape");
        assert_eq!(admits(&host, &unit), Err(RejectReason::RefusePlacementTaint));
    }

    #[test]
    fn over_capacity_rejected() {
        let host = Host::new("h1").with_capacity("cpu", 700);
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 2000);
        assert_eq!(admits(&host, &unit), Err(RejectReason::InsufficientResources));
    }

    #[test]
    fn request_exceeding_every_host_never_admitted() {
        let hosts = vec![spacious_host("h1"), Host::new("h2").with_capacity("cpu", 10)];
        let unit = WorkloadUnit::new("u1", "default", "cape").with_request("cpu", 1_000_000);
        assert!(admissible_hosts(&hosts, &unit).is_empty());
    }

    #[test]
    fn compute_allocated_sums_live_units() {
        let units = vec![
            WorkloadUnit::new("a", "ns", "cape").with_request("cpu", 100),
            WorkloadUnit::new("b", "ns", "cape").with_request("cpu", 250),
        ];
        let allocated = compute_allocated(&units);
        assert_eq!(allocated.get("cpu"), Some(&350));
    }
}

//! The five mandatory SIM policies and the queue-selector tiebreaker
//! (spec.md §4.3.2).

use crate::config::defaults::QUEUE_CARBON_DOMINANCE_FACTOR;
use crate::sim::config::PolicyKind;
use crate::sim::workload::SimHost;
use rand::Rng;

/// Among admissible hosts, the index of the one this policy prefers
/// (spec.md §4.3.2 table). `admissible` holds `(host_index, host)` pairs.
pub fn choose_admissible(policy: PolicyKind, admissible: &[(usize, &SimHost)], rng: &mut impl Rng) -> Option<usize> {
    match policy {
        PolicyKind::CarbonAware => admissible
            .iter()
            .min_by(|(_, a), (_, b)| a.carbon_intensity.partial_cmp(&b.carbon_intensity).unwrap())
            .map(|(i, _)| *i),
        PolicyKind::HighestCarbon => admissible
            .iter()
            .max_by(|(_, a), (_, b)| a.carbon_intensity.partial_cmp(&b.carbon_intensity).unwrap())
            .map(|(i, _)| *i),
        PolicyKind::RoundRobin => admissible
            .iter()
            .min_by_key(|(_, h)| h.bound_count)
            .map(|(i, _)| *i),
        PolicyKind::Random => {
            if admissible.is_empty() {
                None
            } else {
                let pick = rng.gen_range(0..admissible.len());
                Some(admissible[pick].0)
            }
        }
        PolicyKind::LeastLoaded => admissible
            .iter()
            .min_by(|(_, a), (_, b)| a.utilisation().partial_cmp(&b.utilisation()).unwrap())
            .map(|(i, _)| *i),
    }
}

/// Estimate a host's wait time from its queue depth — a crude proxy (queue
/// length times a nominal per-unit service time) good enough for ranking,
/// not for reporting (spec.md §4.3.2).
fn estimated_wait_secs(host: &SimHost) -> f64 {
    const NOMINAL_SERVICE_SECS: f64 = 300.0;
    host.queue.len() as f64 * NOMINAL_SERVICE_SECS
}

/// When no host is immediately admissible, pick the preferred queue to join
/// (spec.md §4.3.2): a combined score of estimated wait time and the
/// policy's primary criterion, with carbon dominating for carbon-aware
/// (sign inverted for highest-carbon) via [`QUEUE_CARBON_DOMINANCE_FACTOR`].
///
/// `None` when `hosts` is empty (a zero-region snapshot, spec.md §3) —
/// there is no queue to prefer.
pub fn choose_queue(policy: PolicyKind, hosts: &[SimHost], rng: &mut impl Rng) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, host) in hosts.iter().enumerate() {
        let wait = estimated_wait_secs(host);
        let score = match policy {
            PolicyKind::CarbonAware => wait + host.carbon_intensity * QUEUE_CARBON_DOMINANCE_FACTOR,
            PolicyKind::HighestCarbon => wait - host.carbon_intensity * QUEUE_CARBON_DOMINANCE_FACTOR,
            PolicyKind::RoundRobin => wait + host.bound_count as f64,
            PolicyKind::Random => {
                let _ = rng.gen::<f64>();
                wait
            }
            PolicyKind::LeastLoaded => wait + host.utilisation() * 1000.0,
        };
        match best {
            None => best = Some((i, score)),
            Some((_, best_score)) if score < best_score => best = Some((i, score)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

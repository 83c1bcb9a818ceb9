//! The discrete-event loop (spec.md §4.3.3).

use crate::config::defaults::SIM_TICK_SECS;
use crate::sim::config::SimConfig;
use crate::sim::event::{EventQueue, SimEvent};
use crate::sim::metrics::{compute_metrics, utilisation_snapshot, CompletedUnit, SimMetrics};
use crate::sim::policies::{choose_admissible, choose_queue};
use crate::sim::workload::{SimHost, SimUnit, UnitId, UnitState};
use crate::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use std::collections::HashMap;
use tracing::{debug, info};

/// One synthetic host per region in the snapshot, at that region's carbon
/// intensity for the whole run (spec.md §4.3.1). A snapshot is a single
/// point-in-time reading; SIM does not model intensity drifting mid-run.
fn build_hosts(snapshot: &Snapshot, config: &SimConfig) -> Vec<SimHost> {
    snapshot
        .regions
        .values()
        .map(|region| SimHost::new(&region.zone, region.carbon_intensity, config.host_compute_units, config.host_memory_units))
        .collect()
}

/// Sample a non-negative duration from a normal distribution, re-sampling
/// until positive — a truncated normal approximated by rejection, adequate
/// at these mean/std ratios (spec.md §4.3.1).
fn sample_positive(rng: &mut StdRng, mean: f64, std: f64) -> f64 {
    let dist = Normal::new(mean, std).expect("mean/std must be finite");
    loop {
        let v = dist.sample(rng);
        if v > 0.0 {
            return v;
        }
    }
}

/// Sample the gap until the next arrival, or `f64::INFINITY` when the
/// arrival rate is zero or negative — a zero `arrivals_per_minute` is a
/// valid input (the `sim` CLI's second positional argument) and must yield
/// "no arrivals" rather than panic on an invalid exponential distribution
/// (spec.md §8 "Running SIM with zero arrivals...").
fn sample_arrival_gap(rate_per_sec: f64, rng: &mut StdRng) -> f64 {
    if rate_per_sec <= 0.0 {
        return f64::INFINITY;
    }
    Exp::new(rate_per_sec)
        .expect("arrival rate must be positive")
        .sample(rng)
}

pub struct SimRun {
    config: SimConfig,
    hosts: Vec<SimHost>,
    units: HashMap<UnitId, SimUnit>,
    events: EventQueue,
    rng: StdRng,
    next_unit_id: UnitId,
    next_arrival_at: f64,
    completed: Vec<CompletedUnit>,
    failed: u64,
    utilisation_samples: Vec<f64>,
}

impl SimRun {
    pub fn new(snapshot: &Snapshot, config: SimConfig) -> Self {
        let hosts = build_hosts(snapshot, &config);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let rate_per_sec = config.arrivals_per_minute / 60.0;
        let first_arrival = sample_arrival_gap(rate_per_sec, &mut rng);
        Self {
            config,
            hosts,
            units: HashMap::new(),
            events: EventQueue::new(),
            rng,
            next_unit_id: 0,
            next_arrival_at: first_arrival,
            completed: Vec::new(),
            failed: 0,
            utilisation_samples: Vec::new(),
        }
    }

    /// Run the full event loop to completion and return the metrics report
    /// (spec.md §4.3.3, §4.3.4). Deterministic for a fixed snapshot, config,
    /// and seed (spec.md §4.3.5).
    pub fn run(mut self) -> SimMetrics {
        let tick = SIM_TICK_SECS as f64;
        let arrivals_cease_at = self.config.duration_hours * 3600.0;
        let hard_cap_at = arrivals_cease_at + crate::config::defaults::SIM_DRAIN_HARD_CAP_HOURS as f64 * 3600.0;
        let mut now = 0.0_f64;

        loop {
            let window_end = now + tick;

            self.drain_completions(window_end);
            self.scan_queues(window_end);
            let arrivals_active = now < arrivals_cease_at;
            if arrivals_active {
                self.advance_arrivals(window_end.min(arrivals_cease_at));
            }

            self.utilisation_samples.push(utilisation_snapshot(&self.hosts));
            now = window_end;

            let all_idle = self.hosts.iter().all(|h| h.queue.is_empty())
                && !self.units.values().any(|u| u.state == UnitState::Started);
            if now >= arrivals_cease_at && all_idle {
                break;
            }
            if now >= hard_cap_at {
                info!(hard_cap_hours = crate::config::defaults::SIM_DRAIN_HARD_CAP_HOURS, "simulation hit drain hard cap with units still queued");
                self.fail_remaining();
                break;
            }
        }

        compute_metrics(&self.completed, self.failed, self.config.duration_hours, &self.utilisation_samples)
    }

    fn fail_remaining(&mut self) {
        for host in &mut self.hosts {
            self.failed += host.queue.len() as u64;
            host.queue.clear();
        }
    }

    fn drain_completions(&mut self, at: f64) {
        for event in self.events.drain_through(at) {
            let SimEvent::Completion { at: completed_at, unit: unit_id } = event else {
                continue;
            };
            let Some(unit) = self.units.get_mut(&unit_id) else {
                continue;
            };
            unit.completed_at = Some(completed_at);
            unit.state = UnitState::Completed;
            let Some(host_idx) = unit.host else { continue };
            let host = &mut self.hosts[host_idx];
            host.compute_allocated -= unit.cpu_request;
            host.memory_allocated -= unit.mem_request;
            self.completed.push(CompletedUnit {
                region: host.region.clone(),
                carbon_intensity: host.carbon_intensity,
                latency_secs: unit.started_at.unwrap_or(unit.created_at) - unit.created_at,
                turnaround_secs: completed_at - unit.created_at,
            });
            debug!(unit = unit_id, host = %host.region, "unit completed");
        }
    }

    /// Step 2 of §4.3.3: for each host's queue, start any unit that now
    /// fits, in queue (arrival) order.
    fn scan_queues(&mut self, now: f64) {
        for host_idx in 0..self.hosts.len() {
            loop {
                let Some(&unit_id) = self.hosts[host_idx].queue.first() else {
                    break;
                };
                let unit = &self.units[&unit_id];
                if !self.hosts[host_idx].fits(unit.cpu_request, unit.mem_request) {
                    break;
                }
                self.hosts[host_idx].queue.remove(0);
                self.start_unit_at(unit_id, host_idx, now);
            }
        }
    }

    fn advance_arrivals(&mut self, until: f64) {
        while self.next_arrival_at <= until {
            let arrival_time = self.next_arrival_at;
            self.spawn_arrival(arrival_time);

            let rate_per_sec = self.config.arrivals_per_minute / 60.0;
            let gap = sample_arrival_gap(rate_per_sec, &mut self.rng);
            self.next_arrival_at += gap;
        }
    }

    fn spawn_arrival(&mut self, at: f64) {
        // A zero-region snapshot (spec.md §3: best/worst null on empty) is
        // valid input to `snapshot::load` and yields no synthetic hosts
        // here — nothing can ever admit or queue this arrival.
        if self.hosts.is_empty() {
            self.failed += 1;
            return;
        }

        let kind_sample: f64 = self.rng.gen();
        let kind = self.config.kind_for_sample(kind_sample);
        let (dur_mean, dur_std) = kind.duration_secs_mean_std();
        let (cpu_mean, cpu_std) = kind.cpu_request_mean_std();
        let (mem_mean, mem_std) = kind.mem_request_mean_std();

        let duration = sample_positive(&mut self.rng, dur_mean, dur_std);
        let cpu = sample_positive(&mut self.rng, cpu_mean, cpu_std).round().max(1.0) as i64;
        let mem = sample_positive(&mut self.rng, mem_mean, mem_std).round().max(1.0) as i64;

        let unit_id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(
            unit_id,
            SimUnit {
                id: unit_id,
                kind,
                cpu_request: cpu,
                mem_request: mem,
                duration_secs: duration,
                created_at: at,
                started_at: None,
                completed_at: None,
                host: None,
                state: UnitState::Queued,
            },
        );

        let admissible: Vec<(usize, &SimHost)> = self
            .hosts
            .iter()
            .enumerate()
            .filter(|(_, h)| h.fits(cpu, mem))
            .collect();

        if let Some(host_idx) = choose_admissible(self.config.policy, &admissible, &mut self.rng) {
            self.start_unit_at(unit_id, host_idx, at);
        } else if let Some(queue_idx) = choose_queue(self.config.policy, &self.hosts, &mut self.rng) {
            self.hosts[queue_idx].queue.push(unit_id);
        } else {
            self.failed += 1;
        }
    }

    fn start_unit_at(&mut self, unit_id: UnitId, host_idx: usize, at: f64) {
        let held = self.units[&unit_id].held_duration_secs();
        let cpu = self.units[&unit_id].cpu_request;
        let mem = self.units[&unit_id].mem_request;

        let host = &mut self.hosts[host_idx];
        host.compute_allocated += cpu;
        host.memory_allocated += mem;
        host.bound_count += 1;

        let unit = self.units.get_mut(&unit_id).unwrap();
        unit.started_at = Some(at);
        unit.host = Some(host_idx);
        unit.state = UnitState::Started;

        self.events.push(SimEvent::Completion {
            at: at + held,
            unit: unit_id,
        });
    }
}

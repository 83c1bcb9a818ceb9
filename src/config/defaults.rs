//! System-wide default constants, grouped by subsystem.
//!
//! Numeric constants in this file must be honoured verbatim — they are not
//! tuning knobs, they are the contract (see spec.md §9 "Numeric constants
//! that must be honoured verbatim").

// ============================================================================
// Intensity Cache (CIC)
// ============================================================================

/// Default poll interval (minutes).
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 5;

/// Default snapshot TTL (minutes).
pub const DEFAULT_TTL_MINUTES: u64 = 10;

/// Default snapshot persistence path.
pub const DEFAULT_CACHE_FILE: &str = "./data/carbon_snapshot.json";

/// Default emissions-service base URL.
pub const DEFAULT_EMISSIONS_BASE_URL: &str = "https://api.electricitymaps.com/v3";

/// Per-zone HTTP request timeout.
pub const ZONE_REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Placement Engine (CAPE)
// ============================================================================

/// Default scheduler name this engine claims ownership of.
pub const DEFAULT_SCHEDULER_NAME: &str = "cape";

/// Sentinel penalty score (g CO2eq/kWh) assigned when a host's region is
/// unknown or missing from the snapshot. Must sort after every real reading.
pub const SENTINEL_PENALTY: f64 = 1000.0;

// ============================================================================
// Simulator (SIM)
// ============================================================================

/// Logical tick size.
pub const SIM_TICK_SECS: u64 = 10;

/// Hard cap on post-arrival drain time (logical hours).
pub const SIM_DRAIN_HARD_CAP_HOURS: u64 = 48;

/// Blocking fraction (portion of duration resources are held) per unit kind.
pub const BLOCKING_FRACTION_COMPUTE_INTENSIVE: f64 = 0.8;
pub const BLOCKING_FRACTION_BATCH: f64 = 0.7;
pub const BLOCKING_FRACTION_IO_BOUND: f64 = 0.3;
pub const BLOCKING_FRACTION_MIXED: f64 = 0.5;

/// Multiplier that lets carbon intensity dominate the queue-selector's
/// combined score over the wait-time term (spec.md §9: "source multiplies
/// by 10^4"). Any constant large enough that no realistic wait-time
/// difference reorders two hosts with different intensities would do; this
/// is the concrete value carried forward verbatim.
pub const QUEUE_CARBON_DOMINANCE_FACTOR: f64 = 10_000.0;

/// Default simulator CLI positional argument values (§6 "Simulator CLI").
pub const DEFAULT_DURATION_HOURS: f64 = 1.0;
pub const DEFAULT_ARRIVALS_PER_MINUTE: f64 = 5.0;
pub const DEFAULT_COMPUTE_JOB_RATIO: f64 = 0.4;

/// Fixed capacity given to each synthetic host SIM constructs, one per
/// region in the input snapshot (§4.3.1).
pub const SYNTH_HOST_COMPUTE_UNITS: i64 = 4;
pub const SYNTH_HOST_MEMORY_UNITS: i64 = 8;

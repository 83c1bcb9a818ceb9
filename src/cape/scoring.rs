//! Scoring (spec.md §4.2.2) — the `Policy` capability (spec.md §9).
//!
//! Lower score wins. `CarbonAwarePolicy` and `BaselinePolicy` are selected
//! once at engine construction by the `CARBON_AWARE_MODE` flag, not
//! branched on inline in the hot path.

use crate::config::defaults::SENTINEL_PENALTY;
use crate::host::Host;
use crate::snapshot::Snapshot;

/// Context available to a policy at scoring time.
pub struct ScoringContext<'a> {
    pub snapshot: Option<&'a Snapshot>,
}

/// A rule mapping (host, context) to a real number, lower preferred
/// (spec.md §9 "Scoring as callback").
pub trait Policy {
    fn score(&self, host: &Host, ctx: &ScoringContext<'_>) -> f64;
}

/// `carbon-aware: off` — every admissible host scores equal; the caller
/// picks the first in iteration order (spec.md §4.2.2).
pub struct BaselinePolicy;

impl Policy for BaselinePolicy {
    fn score(&self, _host: &Host, _ctx: &ScoringContext<'_>) -> f64 {
        0.0
    }
}

/// `carbon-aware: on` — scores by the host's region's current carbon
/// intensity. A host whose region tag is missing from its labels, or
/// missing from the snapshot, receives [`SENTINEL_PENALTY`] (spec.md
/// §4.2.2, §7 MissingRegionTag).
pub struct CarbonAwarePolicy;

impl Policy for CarbonAwarePolicy {
    fn score(&self, host: &Host, ctx: &ScoringContext<'_>) -> f64 {
        let Some(snapshot) = ctx.snapshot else {
            return SENTINEL_PENALTY;
        };
        match host.region_tag() {
            Some(tag) => snapshot.intensity_of(tag).unwrap_or(SENTINEL_PENALTY),
            None => SENTINEL_PENALTY,
        }
    }
}

/// Select the minimum-scoring host among `admissible`, tie-breaking by
/// first-seen order (spec.md §4.2.2, §8).
pub fn select_best<'a>(
    admissible: &[&'a Host],
    policy: &dyn Policy,
    ctx: &ScoringContext<'_>,
) -> Option<(&'a Host, f64)> {
    let mut best: Option<(&Host, f64)> = None;
    for host in admissible {
        let score = policy.score(host, ctx);
        match &best {
            None => best = Some((host, score)),
            Some((_, best_score)) if score < *best_score => best = Some((host, score)),
            _ => {}
        }
    }
    best
}

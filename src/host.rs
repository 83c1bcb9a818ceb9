//! Execution candidates (spec.md §3 "Host").

use std::collections::BTreeMap;

/// Taint effect that refuses placement. Other effect strings are carried
/// but ignored by the admission filter (spec.md §4.2.1 invariant 2).
pub const REFUSE_PLACEMENT_EFFECT: &str = "refuse-placement";

/// Host label keys consulted for region affinity, in fallback order
/// (spec.md §6 "Host labels consulted by CAPE").
pub const REGION_LABEL_KEYS: [&str; 3] = [
    "carbon-region",
    "region",
    "topology.kubernetes.io/zone",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: String,
}

impl Taint {
    pub fn refuses_placement(&self) -> bool {
        self.effect == REFUSE_PLACEMENT_EFFECT
    }
}

/// A resource vector keyed by dimension name (e.g. `"cpu"`, `"memory"`),
/// open for extension per spec.md §3.
pub type ResourceVector = BTreeMap<String, i64>;

#[derive(Debug, Clone)]
pub struct Host {
    pub name: String,
    pub ready: bool,
    pub taints: Vec<Taint>,
    pub labels: BTreeMap<String, String>,
    pub capacity: ResourceVector,
    pub allocated: ResourceVector,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ready: true,
            taints: Vec::new(),
            labels: BTreeMap::new(),
            capacity: ResourceVector::new(),
            allocated: ResourceVector::new(),
        }
    }

    pub fn with_capacity(mut self, dim: impl Into<String>, qty: i64) -> Self {
        self.capacity.insert(dim.into(), qty);
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_taint(mut self, key: impl Into<String>, value: impl Into<String>, effect: impl Into<String>) -> Self {
        self.taints.push(Taint {
            key: key.into(),
            value: value.into(),
            effect: effect.into(),
        });
        self
    }

    /// Whether the host carries any taint with the refuse-placement effect.
    pub fn has_refuse_placement_taint(&self) -> bool {
        self.taints.iter().any(Taint::refuses_placement)
    }

    /// Region tag derived from labels, trying [`REGION_LABEL_KEYS`] in
    /// order; the first non-empty value wins (spec.md §6).
    pub fn region_tag(&self) -> Option<&str> {
        for key in REGION_LABEL_KEYS {
            if let Some(value) = self.labels.get(key) {
                if !value.is_empty() {
                    return Some(value.as_str());
                }
            }
        }
        None
    }

    /// Whether `request` fits within `capacity - allocated` in every
    /// dimension present in the request (spec.md §4.2.1 condition 3). A
    /// dimension absent from `capacity` is treated as zero available.
    pub fn fits(&self, request: &ResourceVector) -> bool {
        request.iter().all(|(dim, &want)| {
            if want <= 0 {
                return true;
            }
            let cap = self.capacity.get(dim).copied().unwrap_or(0);
            let used = self.allocated.get(dim).copied().unwrap_or(0);
            cap - used >= want
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_tag_prefers_primary_label() {
        let host = Host::new("h1")
            .with_label("carbon-region", "A")
            .with_label("region", "B");
        assert_eq!(host.region_tag(), Some("A"));
    }

    #[test]
    fn region_tag_falls_back_in_order() {
        let host = Host::new("h1").with_label("topology.kubernetes.io/zone", "C");
        assert_eq!(host.region_tag(), Some("C"));
    }

    #[test]
    fn region_tag_none_when_absent() {
        let host = Host::new("h1");
        assert_eq!(host.region_tag(), None);
    }

    #[test]
    fn empty_request_fits_any_host() {
        let host = Host::new("h1").with_capacity("cpu", 0);
        let request = ResourceVector::new();
        assert!(host.fits(&request));
    }

    #[test]
    fn fits_respects_allocated() {
        let mut host = Host::new("h1").with_capacity("cpu", 1000);
        host.allocated.insert("cpu".to_string(), 900);
        let mut request = ResourceVector::new();
        request.insert("cpu".to_string(), 200);
        assert!(!host.fits(&request));
        request.insert("cpu".to_string(), 50);
        assert!(host.fits(&request));
    }

    #[test]
    fn refuse_placement_taint_detected() {
        let host = Host::new("h1").with_taint("dedicated", "gpu", REFUSE_PLACEMENT_EFFECT);
        assert!(host.has_refuse_placement_taint());
        let host2 = Host::new("h2").with_taint("dedicated", "gpu", "prefer-avoid");
        assert!(!host2.has_refuse_placement_taint());
    }
}

//! The probe map: which net each probe of a bus observes.

use std::collections::BTreeMap;

use crate::bus::ProbeBus;

/// Ordered mapping from probe index to target net.
///
/// A `None` target means the probe is parked on no net because no default
/// net exists. Entries iterate in index order, which is the natural order of
/// the probe names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMap {
    bus: ProbeBus,
    entries: BTreeMap<u32, Option<String>>,
}

impl ProbeMap {
    /// Creates an empty map for `bus`.
    pub fn new(bus: ProbeBus) -> Self {
        Self {
            bus,
            entries: BTreeMap::new(),
        }
    }

    /// The probe bus the map's indices refer to.
    pub fn bus(&self) -> &ProbeBus {
        &self.bus
    }

    /// Number of mapped probes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no probe is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if probe `index` is mapped.
    pub fn contains(&self, index: u32) -> bool {
        self.entries.contains_key(&index)
    }

    /// Target of probe `index`; `Some(None)` for a probe mapped to no net.
    pub fn get(&self, index: u32) -> Option<Option<&str>> {
        self.entries.get(&index).map(Option::as_deref)
    }

    /// Maps probe `index`, replacing any previous target.
    pub fn insert(&mut self, index: u32, target: Option<String>) {
        self.entries.insert(index, target);
    }

    /// Highest mapped index.
    pub fn highest_index(&self) -> Option<u32> {
        self.entries.keys().next_back().copied()
    }

    /// Iterates over `(probe name, target)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (String, Option<&str>)> + '_ {
        self.entries
            .iter()
            .map(|(&i, t)| (self.bus.probe_name(i), t.as_deref()))
    }

    /// Iterates over `(index, target)` in index order.
    pub fn indexed(&self) -> impl Iterator<Item = (u32, Option<&str>)> + '_ {
        self.entries.iter().map(|(&i, t)| (i, t.as_deref()))
    }

    /// Targets in index order, skipping `None`.
    pub fn targets(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.values().filter_map(Option::as_deref)
    }

    /// Maps every unmapped index below `count` to `default`.
    pub fn pad_to(&mut self, count: u32, default: Option<&str>) {
        for i in 0..count {
            self.entries
                .entry(i)
                .or_insert_with(|| default.map(str::to_string));
        }
    }

    /// Returns `true` if the indices are exactly `0..len`.
    pub fn is_contiguous(&self) -> bool {
        self.entries.keys().copied().eq(0..self.entries.len() as u32)
    }
}

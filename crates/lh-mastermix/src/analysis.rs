//! Allocation units and linked-reagent analysis.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use lh_core::LayoutId;
use lh_labware::Layout;
use tracing::debug;

use crate::keys::{DestWell, ReagentKey};
use crate::options::MastermixOptions;

/// Every (reagent, per-well volume) demanded by the destinations and the
/// wells demanding it, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Units {
    wells: IndexMap<ReagentKey, BTreeSet<DestWell>>,
    liquid_classes: IndexMap<ReagentKey, String>,
}

impl Units {
    /// Collect units from destination layouts. Zero-volume entries are ignored.
    pub fn from_destinations(destinations: &[Layout]) -> Self {
        let mut units = Self::default();
        for (idx, destination) in destinations.iter().enumerate() {
            for (well, entries) in destination.content() {
                for entry in entries.iter().filter(|e| e.volume > 0.0) {
                    let key = ReagentKey::new(entry.reagent.clone(), entry.volume);
                    units
                        .liquid_classes
                        .entry(key.clone())
                        .or_insert_with(|| entry.liquid_class.clone());
                    units
                        .wells
                        .entry(key)
                        .or_default()
                        .insert(DestWell::new(LayoutId::from_usize(idx), well));
                }
            }
        }
        units
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ReagentKey> {
        self.wells.keys()
    }

    pub fn wells_of(&self, key: &ReagentKey) -> Option<&BTreeSet<DestWell>> {
        self.wells.get(key)
    }

    pub fn liquid_class(&self, key: &ReagentKey) -> Option<&str> {
        self.liquid_classes.get(key).map(String::as_str)
    }

    /// Unit keys by ascending volume; equal volumes keep discovery order.
    pub fn ascending(&self) -> Vec<ReagentKey> {
        let mut keys: Vec<ReagentKey> = self.wells.keys().cloned().collect();
        keys.sort_by(|a, b| a.volume().total_cmp(&b.volume()));
        keys
    }

    pub(crate) fn demand(&self) -> IndexMap<ReagentKey, BTreeSet<DestWell>> {
        self.wells.clone()
    }
}

/// Units that must share a mastermix, keyed by each member.
///
/// Units whose well-sets are identical are linked, except that a unit
/// excluded with an earlier (smaller) member is left out, and the largest
/// members are evicted until the group fits under `max_volume`.
pub fn linked_groups(
    units: &Units,
    options: &MastermixOptions,
) -> IndexMap<ReagentKey, Vec<ReagentKey>> {
    let mut by_wells: IndexMap<&BTreeSet<DestWell>, Vec<ReagentKey>> = IndexMap::new();
    for key in units.ascending() {
        if let Some(wells) = units.wells_of(&key) {
            by_wells.entry(wells).or_default().push(key);
        }
    }

    let mut linked = IndexMap::new();
    for (wells, group) in by_wells.into_iter().filter(|(_, g)| g.len() > 1) {
        let mut accepted: Vec<ReagentKey> = Vec::with_capacity(group.len());
        for key in group {
            if options.compatible(&accepted, &key) {
                accepted.push(key);
            }
        }
        while accepted.len() > 1 && !options.fits(&accepted, wells.len()) {
            if let Some(evicted) = accepted.pop() {
                debug!(reagent = %evicted, wells = wells.len(), "evicted from linked group");
            }
        }
        if accepted.len() < 2 {
            continue;
        }
        for key in &accepted {
            let others = accepted.iter().filter(|k| *k != key).cloned().collect();
            linked.insert(key.clone(), others);
        }
    }
    linked
}

//! Action generation.
//!
//! Allocation is greedy first-fit: source plates in caller order, source
//! wells in content order. A destination demand that one plate cannot fully
//! supply is left outstanding for the next plate.

use indexmap::IndexMap;
use lh_core::{LayoutId, VOLUME_EPSILON_UL, ul_to_whole_nl};
use lh_labware::{Layout, ProfileLookup, SourcePlateProfile, UNKNOWN_LIQUID_CLASS, WellId};
use tracing::{debug, info};

use crate::action::{Route, TransferList};
use crate::error::{PlanError, PlanResult};
use crate::feasibility::{FeasibilityReport, MIN_RESIDUAL_UL, check_feasibility};
use crate::inventory::{Consumption, Inventory, StockKey};

/// Everything produced by a successful planning run.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Source layouts with consumed volumes written back.
    pub sources: Vec<Layout>,
    /// One list per source layout, in source order.
    pub transfer_lists: Vec<TransferList>,
    /// Every withdrawal, in the order actions were generated.
    pub ledger: Vec<Consumption>,
    pub report: FeasibilityReport,
}

impl PlanOutcome {
    pub fn action_count(&self) -> usize {
        self.transfer_lists.iter().map(TransferList::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DemandKey {
    destination: LayoutId,
    well: WellId,
    reagent: String,
}

/// Plan every transfer needed to fill `destinations` from `sources`.
///
/// `sources` are consumed: on success they come back depleted inside the
/// outcome, on failure they are dropped. Clone them first to retry.
pub fn plan_transfers(
    mut sources: Vec<Layout>,
    destinations: &[Layout],
    profiles: &impl ProfileLookup,
) -> PlanResult<PlanOutcome> {
    let report = check_feasibility(&mut sources, destinations, profiles)?;

    let mut inventory = Inventory::snapshot(&sources);
    let mut outstanding = demand_of(destinations);
    let mut transfer_lists = Vec::with_capacity(sources.len());

    for (source_idx, source) in sources.iter().enumerate() {
        let profile = profiles
            .profile(source.plate_type())
            .unwrap_or(SourcePlateProfile::PERMISSIVE);
        let list = plan_source(
            LayoutId::from_usize(source_idx),
            source,
            &profile,
            destinations,
            &mut inventory,
            &mut outstanding,
        )?;
        debug!(
            source = source.name(),
            actions = list.len(),
            "transfer list generated"
        );
        transfer_lists.push(list);
    }

    if let Some((key, remaining)) = outstanding
        .into_iter()
        .find(|(_, remaining)| *remaining > VOLUME_EPSILON_UL)
    {
        return Err(PlanError::Exhausted {
            reagent: key.reagent,
            remaining,
            destination_plate: destinations[key.destination.as_usize()].name().to_string(),
            destination_well: key.well,
        });
    }

    inventory.apply_to(&mut sources)?;
    let outcome = PlanOutcome {
        sources,
        transfer_lists,
        ledger: inventory.into_ledger(),
        report,
    };
    info!(actions = outcome.action_count(), "transfer planning complete");
    Ok(outcome)
}

fn demand_of(destinations: &[Layout]) -> IndexMap<DemandKey, f64> {
    let mut demand = IndexMap::new();
    for (idx, destination) in destinations.iter().enumerate() {
        for (well, entries) in destination.content() {
            for entry in entries {
                demand.insert(
                    DemandKey {
                        destination: LayoutId::from_usize(idx),
                        well,
                        reagent: entry.reagent.clone(),
                    },
                    entry.volume,
                );
            }
        }
    }
    demand
}

fn plan_source(
    source_id: LayoutId,
    source: &Layout,
    profile: &SourcePlateProfile,
    destinations: &[Layout],
    inventory: &mut Inventory,
    outstanding: &mut IndexMap<DemandKey, f64>,
) -> PlanResult<TransferList> {
    let mut list = TransferList::new(source.name(), source.plate_type());
    let supplied = source.reagents();

    for (dest_idx, destination) in destinations.iter().enumerate() {
        for reagent in destination
            .reagents()
            .into_iter()
            .filter(|r| supplied.contains(r))
        {
            let source_wells = source.get_wells_containing_liquid(&reagent);
            for dest_well in destination.get_wells_containing_liquid(&reagent) {
                let key = DemandKey {
                    destination: LayoutId::from_usize(dest_idx),
                    well: dest_well,
                    reagent: reagent.clone(),
                };
                let Some(remaining) = outstanding.get_mut(&key) else {
                    continue;
                };
                let allocation = Allocation {
                    source_id,
                    source,
                    profile,
                    destination,
                    dest_well,
                    reagent: &reagent,
                };
                *remaining = allocation.fill(*remaining, &source_wells, inventory, &mut list)?;
            }
        }
    }
    Ok(list)
}

/// Fill one destination well with one reagent from one source plate.
struct Allocation<'a> {
    source_id: LayoutId,
    source: &'a Layout,
    profile: &'a SourcePlateProfile,
    destination: &'a Layout,
    dest_well: WellId,
    reagent: &'a str,
}

impl Allocation<'_> {
    /// Draw up to `remaining` uL and return what is still missing.
    fn fill(
        &self,
        mut remaining: f64,
        source_wells: &[WellId],
        inventory: &mut Inventory,
        list: &mut TransferList,
    ) -> PlanResult<f64> {
        let dead = self.profile.dead_volume;
        let cap = self.profile.max_transfer;
        let mut wells = source_wells.iter().copied();
        let mut current = wells.next();

        while remaining > VOLUME_EPSILON_UL {
            let Some(well) = current else {
                break;
            };
            let stock = StockKey {
                source: self.source_id,
                well,
                reagent: self.reagent.to_string(),
            };
            let usable = inventory.remaining(&stock) - dead;
            if usable < MIN_RESIDUAL_UL {
                current = wells.next();
                continue;
            }

            let (take, exhausts_well) = if remaining <= cap && remaining <= usable {
                (remaining, false)
            } else if remaining > cap && usable >= cap {
                (cap, false)
            } else {
                (usable, true)
            };

            list.push(self.route(well), ul_to_whole_nl(take), self.profile)?;
            inventory.withdraw(stock, take);
            remaining -= take;
            if exhausts_well {
                current = wells.next();
            }
        }
        Ok(remaining.max(0.0))
    }

    fn route(&self, source_well: WellId) -> Route {
        Route {
            reagent: self.reagent.to_string(),
            liquid_class: self
                .source
                .liquid_class_of(self.reagent, source_well)
                .unwrap_or(UNKNOWN_LIQUID_CLASS)
                .to_string(),
            source_plate: self.source.name().to_string(),
            source_plate_type: self.source.plate_type().to_string(),
            source_well,
            destination_plate: self.destination.name().to_string(),
            destination_plate_type: self.destination.plate_type().to_string(),
            destination_well: self.dest_well,
        }
    }
}

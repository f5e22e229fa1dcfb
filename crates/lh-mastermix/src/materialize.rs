//! Turn solved drafts into mastermix plates and rewritten destinations.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;
use lh_core::{VOLUME_EPSILON_UL, volumes_match};
use lh_labware::{Direction, Layout, WellId};
use tracing::{debug, info};

use crate::analysis::Units;
use crate::error::{MastermixError, MastermixResult};
use crate::keys::{DestWell, ReagentKey};
use crate::options::MastermixOptions;
use crate::order::{SeededShuffle, WalkOrder};
use crate::solver::{Draft, search};

/// A named mastermix placed in a well of a mastermix plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Mastermix {
    name: String,
    members: Vec<ReagentKey>,
    wells: BTreeSet<DestWell>,
    plate: String,
    well: WellId,
}

impl Mastermix {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[ReagentKey] {
        &self.members
    }

    /// Destination wells served.
    pub fn wells(&self) -> &BTreeSet<DestWell> {
        &self.wells
    }

    /// Mastermix plate and well holding the preparation.
    pub fn location(&self) -> (&str, WellId) {
        (&self.plate, self.well)
    }

    /// Volume delivered to each destination well, uL.
    pub fn per_well_volume(&self) -> f64 {
        self.members.iter().map(ReagentKey::volume).sum()
    }

    /// Volume of `member` to put into the mastermix well, uL.
    ///
    /// Every member is scaled by the same reaction count so the mix keeps
    /// the per-well proportions.
    pub fn prepared_volume(&self, member: &ReagentKey, options: &MastermixOptions) -> f64 {
        member.volume() * options.reactions(&self.members, self.wells.len()) as f64
    }
}

/// Result of a successful consolidation.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub mastermixes: Vec<Mastermix>,
    /// Mastermix plates holding the raw constituents of each mastermix.
    pub recipes: Vec<Layout>,
    /// Destinations with pooled reagents replaced by mastermix entries.
    pub destinations: Vec<Layout>,
    /// Greedy attempts made before a solution was found.
    pub attempts: u32,
}

impl Consolidation {
    pub fn is_empty(&self) -> bool {
        self.mastermixes.is_empty()
    }

    pub fn mastermix_names(&self) -> IndexSet<String> {
        self.mastermixes.iter().map(|m| m.name.clone()).collect()
    }

    /// Mastermix plates in source form: each well holds its mastermix by
    /// name at the total prepared volume.
    pub fn as_source_layouts(&self) -> MastermixResult<Vec<Layout>> {
        let mut sources = Vec::with_capacity(self.recipes.len());
        for recipe in &self.recipes {
            let mut source = recipe.clone_empty(recipe.name());
            for (well, entries) in recipe.content() {
                let Some(name) = recipe.label_of(well) else {
                    continue;
                };
                let total: f64 = entries.iter().map(|e| e.volume).sum();
                source.add_content(well, name, total, None)?;
                source.set_well_label(well, name)?;
            }
            sources.push(source);
        }
        Ok(sources)
    }
}

/// Consolidate with the default seeded shuffle for retries.
pub fn consolidate(
    destinations: Vec<Layout>,
    template: &Layout,
    options: &MastermixOptions,
) -> MastermixResult<Consolidation> {
    consolidate_with(destinations, template, options, &mut SeededShuffle)
}

/// Pool low-volume reagents of `destinations` into mastermixes.
///
/// `template` gives the format, plate type and available wells of the
/// mastermix plates; further plates are cloned from it when one fills up.
pub fn consolidate_with(
    destinations: Vec<Layout>,
    template: &Layout,
    options: &MastermixOptions,
    walk: &mut impl WalkOrder,
) -> MastermixResult<Consolidation> {
    options.validate()?;
    let units = Units::from_destinations(&destinations);
    let (drafts, attempts) = search(&units, options, walk)?;

    let drafts: Vec<Draft> = drafts.into_iter().filter(|d| !d.wells.is_empty()).collect();
    let names = name_drafts(&drafts);
    for (draft, name) in drafts.iter().zip(&names) {
        let volume = draft.per_well_volume();
        if volume < options.min_transfer - VOLUME_EPSILON_UL {
            return Err(MastermixError::BelowMinimum {
                mastermix: name.clone(),
                volume,
                min_transfer: options.min_transfer,
            });
        }
    }

    let template = blank_template(template)?;
    let mut destinations = destinations;
    let mut recipes: Vec<Layout> = Vec::new();
    let mut mastermixes = Vec::with_capacity(drafts.len());
    for (draft, name) in drafts.into_iter().zip(names) {
        let (plate_idx, well) = next_well(&mut recipes, &template)?;
        let plate = &mut recipes[plate_idx];
        let mastermix = Mastermix {
            name,
            members: draft.members,
            wells: draft.wells,
            plate: plate.name().to_string(),
            well,
        };
        for member in &mastermix.members {
            plate.add_content(
                well,
                member.name(),
                mastermix.prepared_volume(member, options),
                units.liquid_class(member),
            )?;
        }
        plate.set_well_label(well, mastermix.name.clone())?;
        rewrite_destinations(&mut destinations, &mastermix)?;
        debug!(
            mastermix = mastermix.name.as_str(),
            plate = mastermix.plate.as_str(),
            %well,
            wells = mastermix.wells.len(),
            "mastermix placed"
        );
        mastermixes.push(mastermix);
    }

    info!(
        mastermixes = mastermixes.len(),
        plates = recipes.len(),
        attempts,
        "mastermix consolidation complete"
    );
    Ok(Consolidation {
        mastermixes,
        recipes,
        destinations,
        attempts,
    })
}

/// `name@volume` of each member joined by `:`; repeats get a `#k` suffix.
fn name_drafts(drafts: &[Draft]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    drafts
        .iter()
        .map(|draft| {
            let base = draft
                .members
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(":");
            let count = seen.entry(base.clone()).or_default();
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}#{count}")
            }
        })
        .collect()
}

/// Empty copy of the template; every well is available when none were set.
fn blank_template(template: &Layout) -> MastermixResult<Layout> {
    let mut blank = template.clone_empty(template.name());
    if blank.available_wells().is_none() {
        let last = WellId::new(blank.rows() - 1, blank.columns() - 1);
        blank.set_available_wells(&format!("A1:{last}"), true, Direction::Horizontal, false)?;
    }
    Ok(blank)
}

fn next_well(recipes: &mut Vec<Layout>, template: &Layout) -> MastermixResult<(usize, WellId)> {
    if let Some(current) = recipes.last() {
        if let Some(well) = current.get_next_empty_well()? {
            return Ok((recipes.len() - 1, well));
        }
    }
    let name = match recipes.len() {
        0 => template.name().to_string(),
        n => format!("{}_{}", template.name(), n + 1),
    };
    let plate = template.clone_empty(name);
    let well = plate
        .get_next_empty_well()?
        .ok_or_else(|| MastermixError::NoMastermixWells {
            layout: template.name().to_string(),
        })?;
    recipes.push(plate);
    Ok((recipes.len() - 1, well))
}

fn rewrite_destinations(destinations: &mut [Layout], mastermix: &Mastermix) -> MastermixResult<()> {
    let expected = mastermix.per_well_volume();
    for dest in &mastermix.wells {
        let Some(layout) = destinations.get_mut(dest.layout.as_usize()) else {
            continue;
        };
        let removed: f64 = mastermix
            .members
            .iter()
            .map(|m| layout.get_volume_of_liquid_in_well(m.name(), dest.well))
            .sum();
        if !volumes_match(removed, expected) {
            return Err(MastermixError::VolumeImbalance {
                mastermix: mastermix.name.clone(),
                plate: layout.name().to_string(),
                well: dest.well,
                expected,
                removed,
            });
        }
        // add first so the well never passes through empty
        layout.add_content(dest.well, &mastermix.name, expected, None)?;
        for member in &mastermix.members {
            layout.clear_liquid_in_well(dest.well, member.name())?;
        }
    }
    Ok(())
}

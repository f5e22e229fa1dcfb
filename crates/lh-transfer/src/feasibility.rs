//! Pre-flight feasibility check.
//!
//! Runs before any action is generated. Missing reagents fail immediately;
//! volume shortfalls are collected for every reagent and reported together.
//! Wells holding more than their plate type's storage ceiling are cleared and
//! contribute nothing.

use indexmap::{IndexMap, IndexSet};
use lh_labware::{Layout, ProfileLookup, SourcePlateProfile, WellId, reagents_present};
use tracing::{info, warn};

use crate::error::{PlanError, PlanResult, Shortfall};

/// Usable volume below which a source well counts as drained, uL.
pub const MIN_RESIDUAL_UL: f64 = 0.025;

/// A source well whose reagent volume does not even cover the dead volume.
#[derive(Debug, Clone, PartialEq)]
pub struct BelowDeadVolume {
    pub plate: String,
    pub well: WellId,
    pub reagent: String,
    pub stored: f64,
    pub dead_volume: f64,
}

impl BelowDeadVolume {
    /// How far the well is below its dead volume, uL.
    pub fn deficit(&self) -> f64 {
        self.dead_volume - self.stored
    }
}

/// A source well cleared because it exceeded its storage ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct OverStorage {
    pub plate: String,
    pub well: WellId,
    pub total: f64,
    pub max_storage: f64,
}

/// Non-fatal findings of the feasibility check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibilityReport {
    /// Total demand per reagent, uL.
    pub required: IndexMap<String, f64>,
    /// Usable supply per reagent after dead volume, uL.
    pub available: IndexMap<String, f64>,
    pub unknown_plate_types: Vec<String>,
    pub below_dead_volume: Vec<BelowDeadVolume>,
    pub cleared_wells: Vec<OverStorage>,
}

impl FeasibilityReport {
    pub fn has_warnings(&self) -> bool {
        !(self.unknown_plate_types.is_empty()
            && self.below_dead_volume.is_empty()
            && self.cleared_wells.is_empty())
    }
}

/// Check that `sources` can satisfy every reagent demanded by `destinations`.
///
/// Over-storage wells are cleared from `sources` in place.
pub fn check_feasibility(
    sources: &mut [Layout],
    destinations: &[Layout],
    profiles: &impl ProfileLookup,
) -> PlanResult<FeasibilityReport> {
    let required_names = reagents_present(destinations);
    let available_names = reagents_present(sources);
    let missing: Vec<String> = required_names
        .iter()
        .filter(|r| !available_names.contains(*r))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PlanError::MissingReagents { missing });
    }

    let mut report = FeasibilityReport::default();
    let source_profiles = resolve_profiles(sources, profiles, &mut report);

    let mut shortfalls = Vec::new();
    for reagent in &required_names {
        let required: f64 = destinations
            .iter()
            .flat_map(|d| {
                d.get_wells_containing_liquid(reagent)
                    .into_iter()
                    .map(move |w| d.get_volume_of_liquid_in_well(reagent, w))
            })
            .sum();

        let mut available = 0.0;
        let mut last_checked = None;
        for (source, profile) in sources.iter_mut().zip(&source_profiles) {
            for well in source.get_wells_containing_liquid(reagent) {
                last_checked = Some((source.name().to_string(), well));

                let total = source.total_volume_in_well(well);
                if total > profile.max_storage {
                    warn!(
                        plate = source.name(),
                        %well,
                        total,
                        max_storage = profile.max_storage,
                        "source well exceeds storage ceiling; clearing it"
                    );
                    report.cleared_wells.push(OverStorage {
                        plate: source.name().to_string(),
                        well,
                        total,
                        max_storage: profile.max_storage,
                    });
                    source.clear_content_from_well(well)?;
                    continue;
                }

                let stored = source.get_volume_of_liquid_in_well(reagent, well);
                if stored < profile.dead_volume {
                    warn!(
                        plate = source.name(),
                        %well,
                        reagent = reagent.as_str(),
                        stored,
                        dead_volume = profile.dead_volume,
                        "source well below dead volume"
                    );
                    report.below_dead_volume.push(BelowDeadVolume {
                        plate: source.name().to_string(),
                        well,
                        reagent: reagent.clone(),
                        stored,
                        dead_volume: profile.dead_volume,
                    });
                }
                // residue under the drain threshold can never be planned from
                let usable = stored - profile.dead_volume;
                if usable >= MIN_RESIDUAL_UL {
                    available += usable;
                }
            }
        }

        report.required.insert(reagent.clone(), required);
        report.available.insert(reagent.clone(), available);
        if available < required {
            let (last_plate, last_well) = match last_checked {
                Some((plate, well)) => (Some(plate), Some(well)),
                None => (None, None),
            };
            shortfalls.push(Shortfall {
                reagent: reagent.clone(),
                required,
                available,
                extra_needed: required - available,
                last_plate,
                last_well,
            });
        }
    }

    if !shortfalls.is_empty() {
        return Err(PlanError::Shortfall { shortfalls });
    }
    info!(
        reagents = required_names.len(),
        sources = sources.len(),
        destinations = destinations.len(),
        "feasibility check passed"
    );
    Ok(report)
}

fn resolve_profiles(
    sources: &[Layout],
    profiles: &impl ProfileLookup,
    report: &mut FeasibilityReport,
) -> Vec<SourcePlateProfile> {
    let mut unknown: IndexSet<String> = IndexSet::new();
    let resolved = sources
        .iter()
        .map(|s| {
            if profiles.profile(s.plate_type()).is_none() {
                unknown.insert(s.plate_type().to_string());
            }
            profiles.resolve(s.plate_type())
        })
        .collect();
    report.unknown_plate_types = unknown.into_iter().collect();
    resolved
}

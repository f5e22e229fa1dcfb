//! Consolidation and transfer planning for a loaded project.
//!
//! With a mastermix section the plan runs in two stages: raw sources fill the
//! mastermix plates and whatever the destinations still take directly, then
//! the prepared mastermixes are dispensed into the destinations.

use lh_labware::{Layout, PlateProfiles, ProfileLookup};
use lh_mastermix::{Consolidation, consolidate};
use lh_project::schema::Project;
use lh_project::{build_layouts, mastermix_options, mastermix_template, plate_profiles};
use lh_transfer::{FeasibilityReport, Protocol};
use tracing::info;

use crate::error::AppResult;
use crate::project_service::validate_project;

/// Options for planning.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Plan directly from the raw sources even when a mastermix is configured.
    pub no_mastermix: bool,
    /// Replaces the project's shuffle seed.
    pub seed: Option<u64>,
}

/// Response from planning.
#[derive(Debug, Clone)]
pub struct PlanResponse {
    pub protocol: Protocol,
    /// `None` when consolidation was skipped or not configured.
    pub consolidation: Option<Consolidation>,
    pub warnings: Vec<String>,
}

impl PlanResponse {
    pub fn stage_count(&self) -> usize {
        self.protocol.reports().len()
    }
}

/// Pool the project's low-volume reagents into mastermixes.
///
/// Returns `Ok(None)` when the project has no mastermix section.
pub fn consolidate_project(project: &Project, seed: Option<u64>) -> AppResult<Option<Consolidation>> {
    let Some(def) = &project.mastermix else {
        return Ok(None);
    };
    let destinations = build_layouts(&project.destinations)?;
    let template = mastermix_template(def)?;
    let mut options = mastermix_options(def);
    // the prepared well must still cover every draw once the dead volume stays behind
    options.dead_volume = plate_profiles(project)?
        .profile(&def.plate.plate_type)
        .map_or(0.0, |p| p.dead_volume);
    if seed.is_some() {
        options.seed = seed;
    }

    let consolidation = consolidate(destinations, &template, &options)?;
    info!(
        mastermixes = consolidation.mastermixes.len(),
        attempts = consolidation.attempts,
        "consolidation complete"
    );
    Ok(Some(consolidation))
}

/// Plan every transfer of the project.
pub fn plan_project(project: &Project, options: &PlanOptions) -> AppResult<PlanResponse> {
    validate_project(project)?;
    let profiles = plate_profiles(project)?;
    let sources = build_layouts(&project.sources)?;

    let consolidation = if options.no_mastermix {
        None
    } else {
        consolidate_project(project, options.seed)?
    };

    let protocol = match &consolidation {
        Some(c) if !c.is_empty() => plan_two_stage(&project.title, sources, c, &profiles)?,
        Some(c) => Protocol::plan(&project.title, sources, c.destinations.clone(), &profiles)?,
        None => Protocol::plan(
            &project.title,
            sources,
            build_layouts(&project.destinations)?,
            &profiles,
        )?,
    };

    let warnings = protocol.reports().iter().flat_map(describe_warnings).collect();
    info!(
        title = protocol.title(),
        actions = protocol.action_count(),
        stages = protocol.reports().len(),
        "plan complete"
    );
    Ok(PlanResponse {
        protocol,
        consolidation,
        warnings,
    })
}

fn plan_two_stage(
    title: &str,
    sources: Vec<Layout>,
    consolidation: &Consolidation,
    profiles: &PlateProfiles,
) -> AppResult<Protocol> {
    let names = consolidation.mastermix_names();

    let mut stage_one = consolidation.recipes.clone();
    stage_one.extend(
        consolidation
            .destinations
            .iter()
            .map(|d| d.filtered(|e| !names.contains(&e.reagent))),
    );
    let mut protocol = Protocol::plan(title, sources, stage_one, profiles)?;

    let stage_two: Vec<Layout> = consolidation
        .destinations
        .iter()
        .map(|d| d.filtered(|e| names.contains(&e.reagent)))
        .collect();
    protocol.plan_stage(consolidation.as_source_layouts()?, stage_two, profiles)?;
    Ok(protocol)
}

fn describe_warnings(report: &FeasibilityReport) -> Vec<String> {
    let mut warnings = Vec::new();
    for plate_type in &report.unknown_plate_types {
        warnings.push(format!(
            "Unknown source plate type '{plate_type}': no dead volume or transfer limits applied"
        ));
    }
    for well in &report.below_dead_volume {
        warnings.push(format!(
            "{} {}: {} holds {:.3} uL, {:.3} uL below the dead volume",
            well.plate,
            well.well,
            well.reagent,
            well.stored,
            well.deficit()
        ));
    }
    for well in &report.cleared_wells {
        warnings.push(format!(
            "{} {}: {:.3} uL exceeds the {:.3} uL storage limit, well ignored",
            well.plate, well.well, well.total, well.max_storage
        ));
    }
    warnings
}

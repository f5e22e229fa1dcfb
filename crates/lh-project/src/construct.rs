//! Build domain objects from project definitions.

use lh_labware::{
    Direction, LabwareResult, Layout, PlateProfiles, SourcePlateProfile, parse_wells,
};
use lh_mastermix::MastermixOptions;

use crate::schema::{LayoutDef, MastermixDef, Project};

pub fn build_layout(def: &LayoutDef) -> LabwareResult<Layout> {
    let mut layout = Layout::new(&def.name, &def.plate_type, def.rows, def.columns)?;
    let mut direction = Direction::Horizontal;
    if let Some(available) = &def.available_wells {
        direction = available.direction;
        layout.set_available_wells(
            &available.range,
            available.use_outer_wells,
            available.direction,
            available.box_range,
        )?;
    }
    for content in &def.contents {
        let wells = parse_wells(&content.wells, def.rows, def.columns, direction, false)?;
        layout.add_content_to_wells(
            &wells,
            &content.reagent,
            content.volume_ul,
            content.liquid_class.as_deref(),
        )?;
    }
    for (well, label) in &def.labels {
        layout.set_well_label(*well, label.clone())?;
    }
    Ok(layout)
}

pub fn build_layouts(defs: &[LayoutDef]) -> LabwareResult<Vec<Layout>> {
    defs.iter().map(build_layout).collect()
}

/// Built-in profiles with the project's entries added on top.
pub fn plate_profiles(project: &Project) -> LabwareResult<PlateProfiles> {
    let mut profiles = PlateProfiles::builtin();
    for def in &project.plate_profiles {
        let profile = SourcePlateProfile::new(
            &def.plate_type,
            def.dead_volume_ul,
            def.max_transfer_ul,
            def.max_storage_ul,
        )?;
        profiles.insert(def.plate_type.clone(), profile);
    }
    Ok(profiles)
}

pub fn mastermix_options(def: &MastermixDef) -> MastermixOptions {
    MastermixOptions {
        min_transfer: def.min_transfer_ul,
        max_volume: def.max_volume_ul,
        extra_reactions: def.extra_reactions,
        excluded: def
            .excluded_combinations
            .iter()
            .map(|[a, b]| (a.clone(), b.clone()))
            .collect(),
        seed: def.seed,
        max_attempts: def.max_attempts,
        dead_volume: 0.0,
    }
}

pub fn mastermix_template(def: &MastermixDef) -> LabwareResult<Layout> {
    build_layout(&def.plate)
}

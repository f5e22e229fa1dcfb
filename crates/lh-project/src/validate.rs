//! Project validation logic.

use std::collections::HashSet;

use lh_labware::{LabwareError, SourcePlateProfile};

use crate::construct::build_layout;
use crate::schema::{LATEST_VERSION, LayoutDef, MastermixDef, Project};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid layout '{layout}': {source}")]
    Layout {
        layout: String,
        #[source]
        source: LabwareError,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut plate_types = HashSet::new();
    for def in &project.plate_profiles {
        if !plate_types.insert(&def.plate_type) {
            return Err(ValidationError::DuplicateId {
                id: def.plate_type.clone(),
                context: "plate_profiles".to_string(),
            });
        }
        SourcePlateProfile::new(
            &def.plate_type,
            def.dead_volume_ul,
            def.max_transfer_ul,
            def.max_storage_ul,
        )
        .map_err(|e| ValidationError::InvalidValue {
            field: format!("plate_profiles.{}", def.plate_type),
            value: format!(
                "({}, {}, {})",
                def.dead_volume_ul, def.max_transfer_ul, def.max_storage_ul
            ),
            reason: e.to_string(),
        })?;
    }

    let mut plate_names = HashSet::new();
    let mastermix_plate = project.mastermix.iter().map(|m| &m.plate);
    for layout in project
        .sources
        .iter()
        .chain(&project.destinations)
        .chain(mastermix_plate)
    {
        if !plate_names.insert(&layout.name) {
            return Err(ValidationError::DuplicateId {
                id: layout.name.clone(),
                context: "plates".to_string(),
            });
        }
        validate_layout(layout)?;
    }

    if let Some(mastermix) = &project.mastermix {
        validate_mastermix(mastermix)?;
    }

    Ok(())
}

fn validate_layout(layout: &LayoutDef) -> Result<(), ValidationError> {
    for content in &layout.contents {
        if !content.volume_ul.is_finite() || content.volume_ul < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.{}.volume_ul", layout.name, content.reagent),
                value: content.volume_ul.to_string(),
                reason: "volume must be finite and non-negative".to_string(),
            });
        }
        if content.reagent.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.reagent", layout.name),
                value: format!("{:?}", content.reagent),
                reason: "reagent name is empty".to_string(),
            });
        }
    }
    build_layout(layout).map_err(|source| ValidationError::Layout {
        layout: layout.name.clone(),
        source,
    })?;
    Ok(())
}

fn validate_mastermix(mastermix: &MastermixDef) -> Result<(), ValidationError> {
    let invalid = |field: &str, value: String, reason: &str| ValidationError::InvalidValue {
        field: format!("mastermix.{field}"),
        value,
        reason: reason.to_string(),
    };
    if !mastermix.min_transfer_ul.is_finite() || mastermix.min_transfer_ul <= 0.0 {
        return Err(invalid(
            "min_transfer_ul",
            mastermix.min_transfer_ul.to_string(),
            "must be positive",
        ));
    }
    if !mastermix.max_volume_ul.is_finite() || mastermix.max_volume_ul < mastermix.min_transfer_ul
    {
        return Err(invalid(
            "max_volume_ul",
            mastermix.max_volume_ul.to_string(),
            "must be at least min_transfer_ul",
        ));
    }
    if mastermix.max_attempts == 0 {
        return Err(invalid("max_attempts", "0".to_string(), "must be at least 1"));
    }
    for [a, b] in &mastermix.excluded_combinations {
        if a == b {
            return Err(invalid(
                "excluded_combinations",
                format!("[{a}, {b}]"),
                "a reagent cannot exclude itself",
            ));
        }
    }
    if !mastermix.plate.contents.is_empty() {
        return Err(invalid(
            "plate.contents",
            mastermix.plate.contents.len().to_string(),
            "the mastermix plate must start empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ContentDef, PlateProfileDef};

    fn plate(name: &str) -> LayoutDef {
        LayoutDef {
            name: name.into(),
            plate_type: "384PP_AQ_BP".into(),
            rows: 16,
            columns: 24,
            available_wells: None,
            contents: vec![],
            labels: Default::default(),
        }
    }

    fn project() -> Project {
        Project {
            version: 1,
            title: "Test".into(),
            plate_profiles: vec![],
            sources: vec![plate("Source1")],
            destinations: vec![plate("Dest1")],
            mastermix: None,
            picklist: Default::default(),
        }
    }

    fn mastermix() -> MastermixDef {
        MastermixDef {
            min_transfer_ul: 2.0,
            max_volume_ul: 1000.0,
            extra_reactions: 1,
            excluded_combinations: vec![],
            seed: None,
            max_attempts: 1000,
            plate: plate("Mastermix"),
        }
    }

    #[test]
    fn valid_project_passes() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn version_checked() {
        let mut p = project();
        p.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn plate_names_unique_across_roles() {
        let mut p = project();
        p.destinations.push(plate("Source1"));
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));

        let mut p = project();
        p.mastermix = Some(MastermixDef {
            plate: plate("Dest1"),
            ..mastermix()
        });
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn negative_volume_rejected() {
        let mut p = project();
        p.sources[0].contents.push(ContentDef {
            wells: "A1".into(),
            reagent: "Red".into(),
            volume_ul: -1.0,
            liquid_class: None,
        });
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn malformed_range_surfaces_labware_error() {
        let mut p = project();
        p.sources[0].contents.push(ContentDef {
            wells: "A1:Z99".into(),
            reagent: "Red".into(),
            volume_ul: 1.0,
            liquid_class: None,
        });
        let err = validate_project(&p).unwrap_err();
        assert!(matches!(err, ValidationError::Layout { .. }));
        assert!(err.to_string().contains("Source1"));
    }

    #[test]
    fn profile_values_checked() {
        let mut p = project();
        p.plate_profiles.push(PlateProfileDef {
            plate_type: "Custom".into(),
            dead_volume_ul: 5.0,
            max_transfer_ul: 0.0,
            max_storage_ul: 50.0,
        });
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn mastermix_options_checked() {
        let mut p = project();
        p.mastermix = Some(MastermixDef {
            excluded_combinations: vec![["LB".into(), "LB".into()]],
            ..mastermix()
        });
        assert!(validate_project(&p).is_err());

        p.mastermix = Some(MastermixDef {
            max_volume_ul: 1.0,
            ..mastermix()
        });
        assert!(validate_project(&p).is_err());

        p.mastermix = Some(mastermix());
        validate_project(&p).unwrap();
    }
}

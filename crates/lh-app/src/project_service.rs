//! Project loading, saving, validation, and introspection.

use std::path::Path;

use lh_project::schema::{LayoutDef, Project};

use crate::error::{AppError, AppResult};

/// What a plate is used for in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateRole {
    Source,
    Destination,
    Mastermix,
}

impl PlateRole {
    pub fn label(self) -> &'static str {
        match self {
            PlateRole::Source => "source",
            PlateRole::Destination => "destination",
            PlateRole::Mastermix => "mastermix",
        }
    }
}

/// Summary of a plate for listing.
#[derive(Debug, Clone)]
pub struct PlateSummary {
    pub name: String,
    pub role: PlateRole,
    pub plate_type: String,
    pub rows: u32,
    pub columns: u32,
    pub wells_used: usize,
    pub reagents: Vec<String>,
}

/// Load a project from YAML, or JSON when the extension says so.
pub fn load_project(path: &Path) -> AppResult<Project> {
    if !path.exists() {
        return Err(AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    Ok(lh_project::load(path)?)
}

/// Save a project as YAML, or JSON when the extension says so.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => lh_project::save_json(path, project)?,
        _ => lh_project::save_yaml(path, project)?,
    }
    Ok(())
}

/// Validate project structure and check there is something to plan.
pub fn validate_project(project: &Project) -> AppResult<()> {
    lh_project::validate_project(project)?;

    if project.sources.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one source plate".to_string(),
        ));
    }
    if project.destinations.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one destination plate".to_string(),
        ));
    }
    Ok(())
}

/// List every plate of the project in source, destination, mastermix order.
pub fn list_plates(project: &Project) -> AppResult<Vec<PlateSummary>> {
    let mut plates = Vec::new();
    for def in &project.sources {
        plates.push(summarize(def, PlateRole::Source)?);
    }
    for def in &project.destinations {
        plates.push(summarize(def, PlateRole::Destination)?);
    }
    if let Some(mastermix) = &project.mastermix {
        plates.push(summarize(&mastermix.plate, PlateRole::Mastermix)?);
    }
    Ok(plates)
}

fn summarize(def: &LayoutDef, role: PlateRole) -> AppResult<PlateSummary> {
    let layout = lh_project::build_layout(def)?;
    Ok(PlateSummary {
        name: def.name.clone(),
        role,
        plate_type: def.plate_type.clone(),
        rows: def.rows,
        columns: def.columns,
        wells_used: layout.content().count(),
        reagents: layout.reagents().into_iter().collect(),
    })
}

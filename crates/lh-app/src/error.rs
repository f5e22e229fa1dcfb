//! Error types for the lh-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// gives the CLI a single error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Labware error: {0}")]
    Labware(String),

    #[error("Mastermix error: {0}")]
    Mastermix(String),

    #[error("Planning error: {0}")]
    Plan(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lh-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<lh_project::ProjectError> for AppError {
    fn from(err: lh_project::ProjectError) -> Self {
        match err {
            lh_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<lh_project::ValidationError> for AppError {
    fn from(err: lh_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<lh_labware::LabwareError> for AppError {
    fn from(err: lh_labware::LabwareError) -> Self {
        AppError::Labware(err.to_string())
    }
}

impl From<lh_mastermix::MastermixError> for AppError {
    fn from(err: lh_mastermix::MastermixError) -> Self {
        AppError::Mastermix(err.to_string())
    }
}

impl From<lh_transfer::PlanError> for AppError {
    fn from(err: lh_transfer::PlanError) -> Self {
        AppError::Plan(err.to_string())
    }
}

impl From<lh_picklist::PicklistError> for AppError {
    fn from(err: lh_picklist::PicklistError) -> Self {
        AppError::Export(err.to_string())
    }
}

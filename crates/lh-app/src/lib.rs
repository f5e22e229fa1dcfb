//! Shared application service layer for the liquid-handling planner.
//!
//! Centralizes project loading, consolidation, planning and picklist export
//! so that frontends only parse arguments and print results.

pub mod error;
pub mod export_service;
pub mod plan_service;
pub mod project_service;

pub use error::{AppError, AppResult};
pub use export_service::{export_picklists, load_export, modified_files};
pub use plan_service::{PlanOptions, PlanResponse, consolidate_project, plan_project};
pub use project_service::{
    PlateRole, PlateSummary, list_plates, load_project, save_project, validate_project,
};

//! lh-picklist: CSV picklists for the acoustic dispenser and their export manifest.

pub mod group;
pub mod record;
pub mod store;

pub use group::{Picklist, group_transfer_lists};
pub use record::{HEADER, PicklistRecord};
pub use store::{ExportManifest, ExportedFile, PicklistStore, to_csv_bytes};

pub type PicklistResult<T> = Result<T, PicklistError>;

#[derive(thiserror::Error, Debug)]
pub enum PicklistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Picklist not found: {file}")]
    NotFound { file: String },
}

//! Labware-specific error types.

use lh_core::LhError;
use thiserror::Error;

use crate::well::WellId;

pub type LabwareResult<T> = Result<T, LabwareError>;

/// Structural and content errors raised by layouts and well parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabwareError {
    /// Attempted to record a volume below zero.
    #[error("Negative volume {volume} uL for '{reagent}' in well {well}")]
    NegativeVolume {
        reagent: String,
        well: WellId,
        volume: f64,
    },

    #[error("Malformed well id '{well}'")]
    MalformedWell { well: String },

    #[error("Malformed well range '{range}': {reason}")]
    MalformedRange { range: String, reason: String },

    #[error("Well {well} lies outside the {rows}x{columns} format of '{layout}'")]
    WellOutOfRange {
        layout: String,
        well: WellId,
        rows: u32,
        columns: u32,
    },

    /// The well exists but is not part of the layout's available wells.
    #[error("Well {well} is not an available well of '{layout}'")]
    WellNotAvailable { layout: String, well: WellId },

    #[error("Available wells of '{layout}' have not been set")]
    AvailableWellsNotSet { layout: String },

    #[error("Available wells of '{layout}' are already set")]
    AvailableWellsFrozen { layout: String },

    #[error("Label '{label}' is already used by well {well} in '{layout}'")]
    DuplicateLabel {
        layout: String,
        label: String,
        well: WellId,
    },

    #[error("Well {well} of '{layout}' has no content")]
    NoContent { layout: String, well: WellId },

    #[error("Invalid format for '{layout}': {reason}")]
    InvalidFormat { layout: String, reason: String },

    #[error("Invalid plate profile '{plate_type}': {reason}")]
    InvalidProfile { plate_type: String, reason: String },

    #[error("Numeric error: {0}")]
    Numeric(#[from] LhError),
}

impl From<LabwareError> for LhError {
    fn from(err: LabwareError) -> Self {
        match err {
            LabwareError::Numeric(inner) => inner,
            other => LhError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

//! Error types for mastermix consolidation.

use core::fmt;

use lh_core::LhError;
use lh_labware::{LabwareError, WellId};
use thiserror::Error;

use crate::keys::ReagentKey;

/// Why a single greedy attempt could not place a reagent.
#[derive(Debug, Clone, PartialEq)]
pub enum InfeasibleCause {
    /// No reagent or mastermix could be pooled with it.
    NoDonor,
    /// Pooling would exceed the mastermix volume ceiling.
    ExceedsMaximum { volume: f64, max_volume: f64 },
}

/// Structured reason carried by a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Infeasible {
    pub reagent: ReagentKey,
    pub wells: usize,
    pub cause: InfeasibleCause,
}

impl fmt::Display for Infeasible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            InfeasibleCause::NoDonor => write!(
                f,
                "no reagent can be pooled with {} over {} wells",
                self.reagent, self.wells
            ),
            InfeasibleCause::ExceedsMaximum { volume, max_volume } => write!(
                f,
                "mastermix for {} over {} wells needs {volume:.3} uL, above the {max_volume} uL maximum",
                self.reagent, self.wells
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MastermixError {
    #[error("No mastermix solution after {attempts} attempt(s): {reason}")]
    NoSolution { attempts: u32, reason: Infeasible },

    #[error(
        "Mastermix '{mastermix}' replaced {removed} uL in {plate}:{well} but should carry {expected} uL"
    )]
    VolumeImbalance {
        mastermix: String,
        plate: String,
        well: WellId,
        expected: f64,
        removed: f64,
    },

    #[error("Mastermix '{mastermix}' carries {volume} uL per reaction, below the {min_transfer} uL minimum")]
    BelowMinimum {
        mastermix: String,
        volume: f64,
        min_transfer: f64,
    },

    #[error("Mastermix plate '{layout}' has no available wells")]
    NoMastermixWells { layout: String },

    #[error("Invalid mastermix options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Labware error: {0}")]
    Labware(#[from] LabwareError),
}

pub type MastermixResult<T> = Result<T, MastermixError>;

impl MastermixError {
    /// True for failures that indicate a defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::VolumeImbalance { .. } | Self::BelowMinimum { .. })
    }
}

impl From<MastermixError> for LhError {
    fn from(e: MastermixError) -> Self {
        match e {
            MastermixError::Labware(inner) => inner.into(),
            other if other.is_internal() => LhError::Invariant {
                what: other.to_string(),
            },
            other => LhError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_solution_names_reagent() {
        let err = MastermixError::NoSolution {
            attempts: 1000,
            reason: Infeasible {
                reagent: ReagentKey::new("Inducer", 1.0),
                wells: 3,
                cause: InfeasibleCause::NoDonor,
            },
        };
        let text = err.to_string();
        assert!(text.contains("1000 attempt"));
        assert!(text.contains("Inducer@1"));
        assert!(!err.is_internal());
    }

    #[test]
    fn imbalance_is_internal() {
        let err = MastermixError::VolumeImbalance {
            mastermix: "A@1:B@2".into(),
            plate: "Dest".into(),
            well: "A1".parse().unwrap(),
            expected: 3.0,
            removed: 2.0,
        };
        assert!(err.is_internal());
        assert!(matches!(LhError::from(err), LhError::Invariant { .. }));
    }
}

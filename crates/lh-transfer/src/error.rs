//! Error types for transfer planning.

use std::fmt::Write as _;

use lh_core::LhError;
use lh_labware::{LabwareError, WellId};
use thiserror::Error;

use crate::action::ActionError;

pub type PlanResult<T> = Result<T, PlanError>;

/// Aggregate shortfall of one reagent found during feasibility checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub reagent: String,
    /// Total demand across destinations, uL.
    pub required: f64,
    /// Usable volume across sources after dead volume, uL.
    pub available: f64,
    /// `required - available`, uL.
    pub extra_needed: f64,
    /// Last source plate/well inspected for this reagent.
    pub last_plate: Option<String>,
    pub last_well: Option<WellId>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Required reagents found in no source at all.
    #[error("Out of source material: not present in any source: {{{}}}", .missing.join(", "))]
    MissingReagents { missing: Vec<String> },

    /// Present but insufficient in aggregate. Lists every reagent at once.
    #[error("{}", describe_shortfalls(.shortfalls))]
    Shortfall { shortfalls: Vec<Shortfall> },

    /// Sources ran dry while generating actions after feasibility passed.
    #[error(
        "Out of source material while planning '{reagent}': {remaining} uL still required for {destination_plate}:{destination_well}"
    )]
    Exhausted {
        reagent: String,
        remaining: f64,
        destination_plate: String,
        destination_well: WellId,
    },

    #[error("Transfer error: {0}")]
    Transfer(#[from] ActionError),

    #[error("Labware error: {0}")]
    Labware(#[from] LabwareError),
}

impl PlanError {
    /// True for every flavour of insufficient source material.
    pub fn is_out_of_source_material(&self) -> bool {
        matches!(
            self,
            PlanError::MissingReagents { .. }
                | PlanError::Shortfall { .. }
                | PlanError::Exhausted { .. }
        )
    }
}

impl From<PlanError> for LhError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Exhausted { .. } => LhError::Invariant {
                what: err.to_string(),
            },
            other => LhError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

/// Human-readable listing followed by a CSV block for tooling.
fn describe_shortfalls(shortfalls: &[Shortfall]) -> String {
    let mut out = format!(
        "Out of source material: {} reagent(s) short",
        shortfalls.len()
    );
    for s in shortfalls {
        let _ = write!(
            out,
            "\n  - '{}': {:.3} uL more needed (required {:.3} uL, usable {:.3} uL",
            s.reagent, s.extra_needed, s.required, s.available
        );
        match (&s.last_plate, s.last_well) {
            (Some(plate), Some(well)) => {
                let _ = write!(out, ", last checked {plate}:{well})");
            }
            _ => out.push(')'),
        }
    }
    // names may hold commas or quotes, so the block goes through a real CSV writer
    if let Ok(block) = shortfall_csv(shortfalls) {
        out.push('\n');
        out.push_str(block.trim_end());
    }
    out
}

fn shortfall_csv(shortfalls: &[Shortfall]) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["reagent", "extra_volume_ul", "plate", "well"])?;
    for s in shortfalls {
        writer.write_record([
            s.reagent.clone(),
            format!("{:.3}", s.extra_needed),
            s.last_plate.clone().unwrap_or_default(),
            s.last_well.map(|w| w.to_string()).unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

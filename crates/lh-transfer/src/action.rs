//! Transfer actions and per-source-plate transfer lists.

use lh_core::{ActionId, as_nl, ul};
use lh_labware::{SourcePlateProfile, WellId};
use thiserror::Error;

/// Smallest volume a single action may move, in nanoliters.
pub const MIN_TRANSFER_NL: u64 = 25;

/// A single action's volume violates a physical bound.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Transfer of {volume_nl} nL of '{reagent}' is below the 25 nL minimum")]
    BelowMinimum { reagent: String, volume_nl: f64 },

    #[error(
        "Transfer of {volume_nl} nL of '{reagent}' exceeds the {max_nl} nL limit of plate type '{plate_type}'"
    )]
    AboveMaximum {
        reagent: String,
        plate_type: String,
        volume_nl: f64,
        max_nl: f64,
    },

    #[error("Transfer volume {volume_nl} nL of '{reagent}' is not a whole number of nanoliters")]
    FractionalVolume { reagent: String, volume_nl: f64 },
}

/// Where an action takes liquid from and where it puts it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub reagent: String,
    pub liquid_class: String,
    pub source_plate: String,
    pub source_plate_type: String,
    pub source_well: WellId,
    pub destination_plate: String,
    pub destination_plate_type: String,
    pub destination_well: WellId,
}

/// One aspirate/dispense instruction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferAction {
    id: ActionId,
    route: Route,
    volume_nl: u64,
}

impl TransferAction {
    /// Validate `volume_nl` against the absolute floor and the source plate
    /// profile, then build the action.
    pub fn new(
        id: ActionId,
        route: Route,
        volume_nl: f64,
        profile: &SourcePlateProfile,
    ) -> Result<Self, ActionError> {
        if !volume_nl.is_finite() || volume_nl.fract() != 0.0 {
            return Err(ActionError::FractionalVolume {
                reagent: route.reagent,
                volume_nl,
            });
        }
        if volume_nl < MIN_TRANSFER_NL as f64 {
            return Err(ActionError::BelowMinimum {
                reagent: route.reagent,
                volume_nl,
            });
        }
        let max_nl = as_nl(ul(profile.max_transfer));
        // uom converts through m^3, allow for the round trip
        if volume_nl > max_nl + 1e-6 {
            return Err(ActionError::AboveMaximum {
                reagent: route.reagent,
                plate_type: route.source_plate_type,
                volume_nl,
                max_nl,
            });
        }
        Ok(Self {
            id,
            route,
            volume_nl: volume_nl as u64,
        })
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn reagent(&self) -> &str {
        &self.route.reagent
    }

    pub fn volume_nl(&self) -> u64 {
        self.volume_nl
    }

    pub fn volume_ul(&self) -> f64 {
        self.volume_nl as f64 / 1000.0
    }
}

/// Ordered actions drawn from a single source plate.
///
/// Sequence ids start at 0 and have no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferList {
    source_plate: String,
    source_plate_type: String,
    actions: Vec<TransferAction>,
}

impl TransferList {
    pub fn new(source_plate: impl Into<String>, source_plate_type: impl Into<String>) -> Self {
        Self {
            source_plate: source_plate.into(),
            source_plate_type: source_plate_type.into(),
            actions: Vec::new(),
        }
    }

    pub fn source_plate(&self) -> &str {
        &self.source_plate
    }

    pub fn source_plate_type(&self) -> &str {
        &self.source_plate_type
    }

    pub fn actions(&self) -> &[TransferAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Build and append the next action of this list.
    pub fn push(
        &mut self,
        route: Route,
        volume_nl: f64,
        profile: &SourcePlateProfile,
    ) -> Result<&TransferAction, ActionError> {
        let id = ActionId::from_usize(self.actions.len());
        let action = TransferAction::new(id, route, volume_nl, profile)?;
        self.actions.push(action);
        Ok(&self.actions[self.actions.len() - 1])
    }

    /// Total nanoliters of `reagent` moved by this list.
    pub fn total_nl(&self, reagent: &str) -> u64 {
        self.actions
            .iter()
            .filter(|a| a.reagent() == reagent)
            .map(|a| a.volume_nl)
            .sum()
    }
}

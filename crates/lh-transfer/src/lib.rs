//! Transfer planning for liquid-handling robots.
//!
//! Given source layouts (what is where) and destination layouts (what is
//! wanted where), the planner computes per-source-plate transfer lists in two
//! phases:
//!
//! 1. **Feasibility** ([`feasibility`]): every required reagent must exist in
//!    some source and the aggregate usable volume, after dead volume and
//!    storage ceilings, must cover the aggregate demand. All problems are
//!    reported at once.
//! 2. **Action generation** ([`planner`]): for each source plate in order,
//!    greedily draw from that plate's wells (first-fit, content order) into
//!    each destination well, splitting only at the plate type's maximum
//!    single transfer or when a well runs dry.
//!
//! Source layouts are taken by value. Withdrawals are recorded in an
//! append-only [`Inventory`] ledger and written back to the returned layouts
//! only when planning succeeds.

pub mod action;
pub mod error;
pub mod feasibility;
pub mod inventory;
pub mod planner;
pub mod protocol;

pub use action::{ActionError, MIN_TRANSFER_NL, Route, TransferAction, TransferList};
pub use error::{PlanError, PlanResult, Shortfall};
pub use feasibility::{
    BelowDeadVolume, FeasibilityReport, MIN_RESIDUAL_UL, OverStorage, check_feasibility,
};
pub use inventory::{Consumption, Inventory, StockKey};
pub use planner::{PlanOutcome, plan_transfers};
pub use protocol::Protocol;

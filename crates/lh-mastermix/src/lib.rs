//! Mastermix consolidation.
//!
//! Finds reagents that always travel together across destination wells and
//! pools them into mastermixes prepared on a separate plate, so each
//! destination well receives one mastermix transfer instead of several small
//! raw-reagent transfers.
//!
//! Pipeline:
//! - [`analysis`] builds allocation units (reagent at a per-well volume) and
//!   the linked groups that must share a mastermix
//! - [`solver`] runs the greedy assignment, retrying with shuffled orderings
//! - [`materialize`] writes mastermix recipes and rewrites the destinations

pub mod analysis;
pub mod error;
pub mod keys;
pub mod materialize;
pub mod options;
pub mod order;
pub mod solver;

pub use analysis::{Units, linked_groups};
pub use error::{Infeasible, InfeasibleCause, MastermixError, MastermixResult};
pub use keys::{DestWell, ReagentKey};
pub use materialize::{Consolidation, Mastermix, consolidate, consolidate_with};
pub use options::MastermixOptions;
pub use order::{SeededShuffle, WalkOrder};
pub use solver::{Attempt, Draft, search, solve};

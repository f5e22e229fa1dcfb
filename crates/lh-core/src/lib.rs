//! lh-core: stable foundation for liquidplan.
//!
//! Contains:
//! - units (uom volume type + microliter/nanoliter helpers)
//! - numeric (volume tolerance and checks)
//! - ids (compact ids for actions and layouts)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{LhError, LhResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;

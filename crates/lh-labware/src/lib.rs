//! lh-labware: in-memory labware model for liquidplan.
//!
//! Provides:
//! - Well identifiers and well-range parsing
//! - `Layout`, the per-plate content model (reagents, volumes, liquid classes)
//! - Inventory queries across several layouts
//! - Source plate type profiles (dead volume, transfer and storage ceilings)
//!
//! # Example
//!
//! ```
//! use lh_labware::{Layout, WellId};
//!
//! let mut plate = Layout::new("Source1", "384PP_AQ_BP", 16, 24).unwrap();
//! let a1: WellId = "A1".parse().unwrap();
//! plate.add_content(a1, "Red", 40.0, None).unwrap();
//!
//! assert_eq!(plate.get_wells_containing_liquid("Red"), vec![a1]);
//! assert_eq!(plate.get_volume_of_liquid_in_well("Red", a1), 40.0);
//! ```

pub mod error;
pub mod layout;
pub mod profile;
pub mod query;
pub mod well;

pub use error::{LabwareError, LabwareResult};
pub use layout::{ContentEntry, Layout, UNKNOWN_LIQUID_CLASS};
pub use profile::{PlateProfiles, ProfileLookup, SourcePlateProfile};
pub use query::{Occurrence, locate, reagents_present, total_volume_of};
pub use well::{Direction, WellId, all_wells, parse_wells};

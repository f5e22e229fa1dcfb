//! Typed composite keys.

use core::fmt;

use lh_core::LayoutId;
use lh_labware::WellId;

/// A reagent at one per-well volume: the unit of mastermix allocation.
///
/// Two volumes of the same reagent are distinct units. Equality and hashing
/// use the exact bit pattern of the volume.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReagentKey {
    name: String,
    volume_bits: u64,
}

impl ReagentKey {
    pub fn new(name: impl Into<String>, volume: f64) -> Self {
        // fold -0.0 into 0.0
        let volume = if volume == 0.0 { 0.0 } else { volume };
        Self {
            name: name.into(),
            volume_bits: volume.to_bits(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-well volume, uL.
    pub fn volume(&self) -> f64 {
        f64::from_bits(self.volume_bits)
    }
}

impl fmt::Debug for ReagentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReagentKey({self})")
    }
}

impl fmt::Display for ReagentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.volume())
    }
}

/// A destination well qualified by the index of its destination layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestWell {
    pub layout: LayoutId,
    pub well: WellId,
}

impl DestWell {
    pub fn new(layout: LayoutId, well: WellId) -> Self {
        Self { layout, well }
    }
}

impl fmt::Display for DestWell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layout, self.well)
    }
}

//! Source plate type profiles.
//!
//! A profile describes the physical limits of an acoustic-dispenser source
//! plate type. Types missing from the table fall back to
//! [`SourcePlateProfile::PERMISSIVE`] with a warning.

use indexmap::IndexMap;
use lh_core::ensure_volume;
use tracing::warn;

use crate::error::{LabwareError, LabwareResult};

/// Physical limits of a source plate type, all in microliters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcePlateProfile {
    /// Volume the dispenser cannot reach in each well.
    pub dead_volume: f64,
    /// Largest volume moved by a single transfer action.
    pub max_transfer: f64,
    /// Largest volume a well may hold before it is considered unusable.
    pub max_storage: f64,
}

impl SourcePlateProfile {
    /// No dead volume, unlimited transfer and storage.
    pub const PERMISSIVE: Self = Self {
        dead_volume: 0.0,
        max_transfer: f64::INFINITY,
        max_storage: f64::INFINITY,
    };

    pub fn new(
        plate_type: &str,
        dead_volume: f64,
        max_transfer: f64,
        max_storage: f64,
    ) -> LabwareResult<Self> {
        let invalid = |reason: String| LabwareError::InvalidProfile {
            plate_type: plate_type.to_string(),
            reason,
        };
        let dead_volume =
            ensure_volume(dead_volume, "dead volume").map_err(|e| invalid(e.to_string()))?;
        if max_transfer.is_nan() || max_transfer <= 0.0 {
            return Err(invalid(format!("max transfer {max_transfer} must be positive")));
        }
        if max_storage.is_nan() || max_storage < dead_volume {
            return Err(invalid(format!(
                "max storage {max_storage} below dead volume {dead_volume}"
            )));
        }
        Ok(Self {
            dead_volume,
            max_transfer,
            max_storage,
        })
    }
}

/// Lookup of source plate profiles by plate type name.
pub trait ProfileLookup {
    /// Profile for `plate_type`, `None` when the type is unknown.
    fn profile(&self, plate_type: &str) -> Option<SourcePlateProfile>;

    /// Profile for `plate_type`, falling back to permissive limits.
    fn resolve(&self, plate_type: &str) -> SourcePlateProfile {
        match self.profile(plate_type) {
            Some(profile) => profile,
            None => {
                warn!(
                    plate_type,
                    "unknown source plate type; using no dead volume and no transfer/storage limits"
                );
                SourcePlateProfile::PERMISSIVE
            }
        }
    }
}

/// Table of known source plate types.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateProfiles {
    table: IndexMap<String, SourcePlateProfile>,
}

impl Default for PlateProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlateProfiles {
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    /// Acoustic dispenser plate types known out of the box.
    pub fn builtin() -> Self {
        let mut profiles = Self::empty();
        for (name, dead, transfer, storage) in [
            ("384PP_AQ_BP", 15.0, 0.5, 65.0),
            ("384PP_AQ_SP", 15.0, 0.5, 65.0),
            ("384LDV_AQ_B2", 3.0, 0.5, 14.0),
            ("6RES_AQ_BP2", 250.0, 0.5, 2800.0),
        ] {
            profiles.table.insert(
                name.to_string(),
                SourcePlateProfile {
                    dead_volume: dead,
                    max_transfer: transfer,
                    max_storage: storage,
                },
            );
        }
        profiles
    }

    /// Add or replace a plate type.
    pub fn insert(&mut self, plate_type: impl Into<String>, profile: SourcePlateProfile) {
        self.table.insert(plate_type.into(), profile);
    }

    pub fn with(mut self, plate_type: impl Into<String>, profile: SourcePlateProfile) -> Self {
        self.insert(plate_type, profile);
        self
    }

    pub fn contains(&self, plate_type: &str) -> bool {
        self.table.contains_key(plate_type)
    }

    pub fn plate_types(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

impl ProfileLookup for PlateProfiles {
    fn profile(&self, plate_type: &str) -> Option<SourcePlateProfile> {
        self.table.get(plate_type).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_types_resolve() {
        let profiles = PlateProfiles::builtin();
        let pp = profiles.resolve("384PP_AQ_BP");
        assert_eq!(pp.dead_volume, 15.0);
        assert_eq!(pp.max_transfer, 0.5);
        assert!(profiles.contains("6RES_AQ_BP2"));
    }

    #[test]
    fn unknown_type_is_permissive() {
        let profiles = PlateProfiles::empty();
        assert_eq!(profiles.profile("Nope"), None);
        assert_eq!(profiles.resolve("Nope"), SourcePlateProfile::PERMISSIVE);
    }

    #[test]
    fn override_replaces_entry() {
        let custom = SourcePlateProfile::new("384PP_AQ_BP", 3.0, 0.5, 100.0).unwrap();
        let profiles = PlateProfiles::builtin().with("384PP_AQ_BP", custom);
        assert_eq!(profiles.resolve("384PP_AQ_BP").dead_volume, 3.0);
    }

    #[test]
    fn invalid_profiles_rejected() {
        assert!(SourcePlateProfile::new("x", -1.0, 0.5, 10.0).is_err());
        assert!(SourcePlateProfile::new("x", 1.0, 0.0, 10.0).is_err());
        assert!(SourcePlateProfile::new("x", 20.0, 0.5, 10.0).is_err());
        assert!(SourcePlateProfile::new("x", 0.0, f64::INFINITY, f64::INFINITY).is_ok());
    }
}

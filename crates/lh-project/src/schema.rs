//! Project schema definitions.

use std::collections::BTreeMap;

use lh_labware::{Direction, WellId};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub title: String,
    /// Extra or overriding source plate profiles.
    #[serde(default)]
    pub plate_profiles: Vec<PlateProfileDef>,
    #[serde(default)]
    pub sources: Vec<LayoutDef>,
    #[serde(default)]
    pub destinations: Vec<LayoutDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastermix: Option<MastermixDef>,
    #[serde(default)]
    pub picklist: PicklistDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlateProfileDef {
    pub plate_type: String,
    pub dead_volume_ul: f64,
    pub max_transfer_ul: f64,
    pub max_storage_ul: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutDef {
    pub name: String,
    pub plate_type: String,
    pub rows: u32,
    pub columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_wells: Option<AvailableWellsDef>,
    #[serde(default)]
    pub contents: Vec<ContentDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<WellId, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableWellsDef {
    pub range: String,
    #[serde(default = "default_true")]
    pub use_outer_wells: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub box_range: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentDef {
    /// A well, a range (`A1:B3`) or a comma-separated list of either.
    pub wells: String,
    pub reagent: String,
    pub volume_ul: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MastermixDef {
    pub min_transfer_ul: f64,
    pub max_volume_ul: f64,
    #[serde(default)]
    pub extra_reactions: u32,
    #[serde(default)]
    pub excluded_combinations: Vec<[String; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Format of the plate mastermixes are prepared in. Must have no contents.
    pub plate: LayoutDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PicklistDef {
    /// Write one file per source plate type instead of per source plate.
    #[serde(default)]
    pub merge_plate_types: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    1000
}

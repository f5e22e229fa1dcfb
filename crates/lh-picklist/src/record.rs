//! One CSV row per transfer action.

use lh_transfer::TransferAction;
use serde::{Deserialize, Serialize};

/// Column names in file order.
pub const HEADER: [&str; 9] = [
    "Transfer ID",
    "Reagent",
    "Source Plate Name",
    "Liquid Class",
    "Source Well",
    "Destination Plate Name",
    "Destination Plate Type",
    "Destination Well",
    "Transfer Volume",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistRecord {
    #[serde(rename = "Transfer ID")]
    pub transfer_id: u64,
    #[serde(rename = "Reagent")]
    pub reagent: String,
    #[serde(rename = "Source Plate Name")]
    pub source_plate: String,
    #[serde(rename = "Liquid Class")]
    pub liquid_class: String,
    #[serde(rename = "Source Well")]
    pub source_well: String,
    #[serde(rename = "Destination Plate Name")]
    pub destination_plate: String,
    #[serde(rename = "Destination Plate Type")]
    pub destination_plate_type: String,
    #[serde(rename = "Destination Well")]
    pub destination_well: String,
    /// Nanoliters.
    #[serde(rename = "Transfer Volume")]
    pub volume_nl: u64,
}

impl PicklistRecord {
    pub fn from_action(transfer_id: u64, action: &TransferAction) -> Self {
        let route = action.route();
        Self {
            transfer_id,
            reagent: route.reagent.clone(),
            source_plate: route.source_plate.clone(),
            liquid_class: route.liquid_class.clone(),
            source_well: route.source_well.to_string(),
            destination_plate: route.destination_plate.clone(),
            destination_plate_type: route.destination_plate_type.clone(),
            destination_well: route.destination_well.to_string(),
            volume_nl: action.volume_nl(),
        }
    }
}

//! Group transfer lists into picklist files.

use std::collections::HashSet;

use indexmap::IndexMap;
use lh_transfer::TransferList;

use crate::record::PicklistRecord;

/// Rows destined for one CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Picklist {
    /// File name without extension.
    pub stem: String,
    pub plate_type: String,
    pub source_plates: Vec<String>,
    pub records: Vec<PicklistRecord>,
}

impl Picklist {
    pub fn total_volume_nl(&self) -> u64 {
        self.records.iter().map(|r| r.volume_nl).sum()
    }
}

/// One picklist per non-empty transfer list, or with `merge_plate_types` one
/// per source plate type.
///
/// Unmerged rows keep the action's sequence id; merged rows are numbered
/// by position in the file. Stems are unique, later clashes get `_2`, `_3`...
pub fn group_transfer_lists(lists: &[TransferList], merge_plate_types: bool) -> Vec<Picklist> {
    let mut picklists = if merge_plate_types {
        merged(lists)
    } else {
        per_plate(lists)
    };
    dedup_stems(&mut picklists);
    picklists
}

fn per_plate(lists: &[TransferList]) -> Vec<Picklist> {
    lists
        .iter()
        .filter(|l| !l.is_empty())
        .map(|list| Picklist {
            stem: sanitize(list.source_plate()),
            plate_type: list.source_plate_type().to_string(),
            source_plates: vec![list.source_plate().to_string()],
            records: list
                .actions()
                .iter()
                .map(|a| PicklistRecord::from_action(u64::from(a.id().index()), a))
                .collect(),
        })
        .collect()
}

fn merged(lists: &[TransferList]) -> Vec<Picklist> {
    let mut by_type: IndexMap<&str, Picklist> = IndexMap::new();
    for list in lists.iter().filter(|l| !l.is_empty()) {
        let picklist = by_type
            .entry(list.source_plate_type())
            .or_insert_with(|| Picklist {
                stem: sanitize(list.source_plate_type()),
                plate_type: list.source_plate_type().to_string(),
                source_plates: Vec::new(),
                records: Vec::new(),
            });
        if !picklist.source_plates.iter().any(|p| p == list.source_plate()) {
            picklist.source_plates.push(list.source_plate().to_string());
        }
        for action in list.actions() {
            let row = picklist.records.len() as u64;
            picklist.records.push(PicklistRecord::from_action(row, action));
        }
    }
    by_type.into_values().collect()
}

// Compared case-insensitively so two files never share a name on any filesystem.
fn dedup_stems(picklists: &mut [Picklist]) {
    let mut used: HashSet<String> = HashSet::new();
    for picklist in picklists {
        let mut stem = picklist.stem.clone();
        let mut k = 2;
        while !used.insert(stem.to_ascii_lowercase()) {
            stem = format!("{}_{k}", picklist.stem);
            k += 1;
        }
        picklist.stem = stem;
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_labware::SourcePlateProfile;
    use lh_transfer::Route;

    fn list(plate: &str, plate_type: &str, volumes: &[f64]) -> TransferList {
        let mut list = TransferList::new(plate, plate_type);
        for v in volumes {
            let route = Route {
                reagent: "Red".into(),
                liquid_class: "AQ_BP".into(),
                source_plate: plate.into(),
                source_plate_type: plate_type.into(),
                source_well: "A1".parse().unwrap(),
                destination_plate: "Dest 1".into(),
                destination_plate_type: "96_flat".into(),
                destination_well: "B2".parse().unwrap(),
            };
            list.push(route, *v, &SourcePlateProfile::PERMISSIVE).unwrap();
        }
        list
    }

    #[test]
    fn one_file_per_source_plate() {
        let lists = [
            list("Source 1", "384PP_AQ_BP", &[500.0, 250.0]),
            list("Source2", "384PP_AQ_BP", &[100.0]),
            list("Empty", "384PP_AQ_BP", &[]),
        ];
        let picklists = group_transfer_lists(&lists, false);
        assert_eq!(picklists.len(), 2);
        assert_eq!(picklists[0].stem, "Source_1");
        assert_eq!(picklists[0].total_volume_nl(), 750);
        assert_eq!(picklists[1].records[0].transfer_id, 0);
    }

    #[test]
    fn merged_by_plate_type_renumbers_rows() {
        let lists = [
            list("S1", "384PP_AQ_BP", &[500.0, 250.0]),
            list("R1", "6RES_AQ_BP2", &[300.0]),
            list("S2", "384PP_AQ_BP", &[100.0]),
        ];
        let picklists = group_transfer_lists(&lists, true);
        assert_eq!(picklists.len(), 2);
        let pp = &picklists[0];
        assert_eq!(pp.plate_type, "384PP_AQ_BP");
        assert_eq!(pp.source_plates, ["S1", "S2"]);
        let ids: Vec<u64> = pp.records.iter().map(|r| r.transfer_id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(pp.records[2].source_plate, "S2");
    }

    #[test]
    fn clashing_stems_get_suffixes() {
        let lists = [
            list("Plate 1", "384PP_AQ_BP", &[100.0]),
            list("Plate_1", "384PP_AQ_BP", &[200.0]),
            list("plate-1", "384PP_AQ_BP", &[300.0]),
            list("PLATE_1", "384PP_AQ_BP", &[400.0]),
            list("Plate_1_2", "384PP_AQ_BP", &[500.0]),
        ];
        let stems: Vec<String> = group_transfer_lists(&lists, false)
            .into_iter()
            .map(|p| p.stem)
            .collect();
        assert_eq!(stems, ["Plate_1", "Plate_1_2", "plate-1", "PLATE_1_3", "Plate_1_2_2"]);
    }
}

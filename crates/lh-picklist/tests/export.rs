use lh_labware::{Layout, PlateProfiles, SourcePlateProfile, WellId};
use lh_picklist::{PicklistStore, group_transfer_lists};
use lh_transfer::plan_transfers;

fn w(s: &str) -> WellId {
    s.parse().unwrap()
}

fn planned_lists() -> Vec<lh_transfer::TransferList> {
    let profiles = PlateProfiles::builtin().with(
        "Echo_Test",
        SourcePlateProfile::new("Echo_Test", 3.0, 0.5, 100.0).unwrap(),
    );
    let mut s1 = Layout::new("Source1", "Echo_Test", 16, 24).unwrap();
    s1.add_content(w("A1"), "Red", 40.0, Some("AQ_BP")).unwrap();
    let mut s2 = Layout::new("Source2", "Echo_Test", 16, 24).unwrap();
    s2.add_content(w("A1"), "Blue", 40.0, Some("AQ_BP")).unwrap();
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content_to_range("B2:B4", "Red", 1.0, None).unwrap();
    d.add_content(w("C1"), "Blue", 0.3, None).unwrap();

    plan_transfers(vec![s1, s2], &[d], &profiles)
        .unwrap()
        .transfer_lists
}

#[test]
fn export_per_source_plate() {
    let dir = std::env::temp_dir().join("lh_picklist_export_per_plate");
    let store = PicklistStore::new(dir).unwrap();
    let picklists = group_transfer_lists(&planned_lists(), false);
    let manifest = store.write("Colors", &picklists, false).unwrap();

    assert_eq!(manifest.files.len(), 2);
    assert_eq!(manifest.files[0].file, "Source1.csv");
    assert_eq!(manifest.files[0].transfers, 6);
    assert_eq!(manifest.files[0].total_volume_nl, 3000);
    assert_eq!(manifest.files[1].total_volume_nl, 300);

    let loaded = store.load_manifest().unwrap();
    assert_eq!(loaded, manifest);
    for entry in &loaded.files {
        assert!(store.verify(entry).unwrap());
    }

    let rows = store.read("Source1.csv").unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[5].transfer_id, 5);
    assert_eq!(rows[5].destination_well, "B4");
    assert_eq!(rows[0].liquid_class, "AQ_BP");
}

#[test]
fn export_merged_by_plate_type() {
    let dir = std::env::temp_dir().join("lh_picklist_export_merged");
    let store = PicklistStore::new(dir).unwrap();
    let picklists = group_transfer_lists(&planned_lists(), true);
    let manifest = store.write("Colors", &picklists, true).unwrap();

    assert_eq!(manifest.files.len(), 1);
    assert_eq!(manifest.files[0].file, "Echo_Test.csv");
    assert_eq!(manifest.files[0].source_plates, ["Source1", "Source2"]);

    let rows = store.read("Echo_Test.csv").unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[6].transfer_id, 6);
    assert_eq!(rows[6].source_plate, "Source2");
    assert_eq!(rows[6].volume_nl, 300);
}

#[test]
fn similar_plate_names_keep_separate_files() {
    let profiles = PlateProfiles::empty().with(
        "Echo_Test",
        SourcePlateProfile::new("Echo_Test", 3.0, 0.5, 100.0).unwrap(),
    );
    let mut s1 = Layout::new("Plate 1", "Echo_Test", 16, 24).unwrap();
    s1.add_content(w("A1"), "Red", 40.0, None).unwrap();
    let mut s2 = Layout::new("Plate_1", "Echo_Test", 16, 24).unwrap();
    s2.add_content(w("A1"), "Blue", 40.0, None).unwrap();
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content(w("B2"), "Red", 0.5, None).unwrap();
    d.add_content(w("C1"), "Blue", 0.3, None).unwrap();
    let lists = plan_transfers(vec![s1, s2], &[d], &profiles)
        .unwrap()
        .transfer_lists;

    let dir = std::env::temp_dir().join("lh_picklist_export_clash");
    let _ = std::fs::remove_dir_all(&dir);
    let store = PicklistStore::new(dir.clone()).unwrap();
    let manifest = store
        .write("Clash", &group_transfer_lists(&lists, false), false)
        .unwrap();

    let files: Vec<&str> = manifest.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(files, ["Plate_1.csv", "Plate_1_2.csv"]);
    assert_eq!(store.read("Plate_1.csv").unwrap()[0].source_plate, "Plate 1");
    assert_eq!(store.read("Plate_1_2.csv").unwrap()[0].source_plate, "Plate_1");
    let csvs = std::fs::read_dir(&dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "csv"))
        .count();
    assert_eq!(csvs, 2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_reported() {
    let dir = std::env::temp_dir().join("lh_picklist_missing");
    let store = PicklistStore::new(dir).unwrap();
    assert!(store.read("nope.csv").is_err());
}

//! Integration tests for lh-labware.

use lh_labware::{
    Direction, LabwareError, Layout, PlateProfiles, ProfileLookup, SourcePlateProfile, WellId,
    locate, reagents_present,
};

fn w(s: &str) -> WellId {
    s.parse().unwrap()
}

#[test]
fn source_and_destination_inventory() {
    let mut source = Layout::new("Source1", "384PP_AQ_BP", 16, 24).unwrap();
    source.add_content(w("A1"), "Red", 40.0, Some("AQ_BP")).unwrap();
    source.add_content(w("A2"), "Red", 20.0, Some("AQ_BP")).unwrap();
    source.add_content(w("B1"), "Blue", 30.0, None).unwrap();

    let mut dest = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    dest.set_available_wells("A1:H12", true, Direction::Vertical, false)
        .unwrap();
    dest.add_content_to_range("B2:B4", "Red", 1.0, None).unwrap();

    let required = reagents_present(std::slice::from_ref(&dest));
    let available = reagents_present(std::slice::from_ref(&source));
    assert!(required.is_subset(&available));

    // Vertical allocation order: A1 is still free, B2 is taken.
    assert_eq!(dest.get_next_empty_well().unwrap(), Some(w("A1")));
    assert!(!dest.empty_wells().contains(&w("B2")));

    let reds = locate("Red", std::slice::from_ref(&source));
    assert_eq!(
        reds.iter().map(|o| o.well).collect::<Vec<_>>(),
        vec![w("A1"), w("A2")]
    );
}

#[test]
fn capacity_error_when_outside_available() {
    let mut mm = Layout::new("Mastermix", "384PP_AQ_BP", 16, 24).unwrap();
    mm.set_available_wells("A1:B2", true, Direction::Horizontal, true)
        .unwrap();
    assert_eq!(mm.available_wells().unwrap().len(), 4);
    let err = mm.add_content(w("A3"), "Red", 1.0, None).unwrap_err();
    assert!(matches!(err, LabwareError::WellNotAvailable { .. }));
}

#[test]
fn storage_profile_lookup() {
    let custom = SourcePlateProfile::new("Tiny", 3.0, 0.5, 50.0).unwrap();
    let profiles = PlateProfiles::builtin().with("Tiny", custom);
    assert_eq!(profiles.resolve("Tiny").max_storage, 50.0);
    assert!(profiles.resolve("Unlisted").max_transfer.is_infinite());
}

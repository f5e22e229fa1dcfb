//! End-to-end planning scenarios.

use lh_labware::{Layout, PlateProfiles, SourcePlateProfile, WellId};
use lh_transfer::{PlanError, Protocol, plan_transfers};

fn w(s: &str) -> WellId {
    s.parse().unwrap()
}

fn profiles() -> PlateProfiles {
    PlateProfiles::builtin().with(
        "Echo_Test",
        SourcePlateProfile::new("Echo_Test", 3.0, 0.5, 100.0).unwrap(),
    )
}

fn red_source() -> Layout {
    let mut s = Layout::new("Source1", "Echo_Test", 16, 24).unwrap();
    s.add_content(w("A1"), "Red", 40.0, Some("AQ_BP")).unwrap();
    s
}

#[test]
fn red_spread_over_three_wells() {
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content_to_range("B2:B4", "Red", 1.0, None).unwrap();

    let outcome = plan_transfers(vec![red_source()], &[d], &profiles()).unwrap();
    let list = &outcome.transfer_lists[0];
    assert_eq!(list.source_plate(), "Source1");
    assert_eq!(list.len(), 6);
    assert!(list.actions().iter().all(|a| a.volume_nl() == 500));

    let ids: Vec<u32> = list.actions().iter().map(|a| a.id().index()).collect();
    assert_eq!(ids, [0, 1, 2, 3, 4, 5]);
    let dests: Vec<String> = list
        .actions()
        .iter()
        .map(|a| a.route().destination_well.to_string())
        .collect();
    assert_eq!(dests, ["B2", "B2", "B3", "B3", "B4", "B4"]);

    let left = outcome.sources[0].get_volume_of_liquid_in_well("Red", w("A1"));
    assert!((left - 37.0).abs() < 1e-9);
    assert_eq!(outcome.ledger.len(), 6);
}

#[test]
fn missing_reagent_emits_nothing() {
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content(w("A1"), "Yellow", 1.0, None).unwrap();

    let err = plan_transfers(vec![red_source()], &[d], &profiles()).unwrap_err();
    assert_eq!(
        err,
        PlanError::MissingReagents {
            missing: vec!["Yellow".to_string()]
        }
    );
    assert!(err.is_out_of_source_material());
}

#[test]
fn insufficient_yellow_quantifies_shortfall() {
    let mut s = Layout::new("Source1", "Echo_Test", 16, 24).unwrap();
    s.add_content(w("C1"), "Yellow", 9.0, None).unwrap();
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content(w("A1"), "Yellow", 10.0, None).unwrap();

    let err = plan_transfers(vec![s], &[d], &profiles()).unwrap_err();
    let PlanError::Shortfall { shortfalls } = &err else {
        panic!("expected shortfall, got {err}");
    };
    assert_eq!(shortfalls[0].reagent, "Yellow");
    assert!((shortfalls[0].extra_needed - 4.0).abs() < 1e-9);
    assert_eq!(shortfalls[0].last_plate.as_deref(), Some("Source1"));
    assert!(err.to_string().contains("Yellow,4.000,Source1,C1"));
}

#[test]
fn multiple_destination_plates_share_a_source() {
    let mut d1 = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d1.add_content(w("A1"), "Red", 0.5, None).unwrap();
    let mut d2 = Layout::new("Dest2", "96_flat", 8, 12).unwrap();
    d2.add_content(w("A1"), "Red", 0.25, None).unwrap();

    let protocol = Protocol::plan("Two plates", vec![red_source()], vec![d1, d2], &profiles())
        .unwrap();
    let actions = protocol.transfer_lists()[0].actions();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].route().destination_plate, "Dest1");
    assert_eq!(actions[1].route().destination_plate, "Dest2");
    assert_eq!(actions[1].volume_nl(), 250);
    assert_eq!(actions[1].route().destination_plate_type, "96_flat");
}

#[test]
fn failed_run_leaves_callers_copy_untouched() {
    let source = red_source();
    let mut d = Layout::new("Dest1", "96_flat", 8, 12).unwrap();
    d.add_content(w("A1"), "Red", 1.0, None).unwrap();
    d.add_content(w("A2"), "Red", 0.01, None).unwrap();

    let err = plan_transfers(vec![source.clone()], &[d], &profiles()).unwrap_err();
    assert!(matches!(err, PlanError::Transfer(_)));
    assert_eq!(source.get_volume_of_liquid_in_well("Red", w("A1")), 40.0);
}

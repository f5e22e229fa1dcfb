//! Property tests: conservation, dead volume and cap respect, and that a
//! passing feasibility check never ends in a dry source.

use std::collections::HashMap;

use lh_labware::{Layout, PlateProfiles, SourcePlateProfile, WellId};
use lh_transfer::{MIN_TRANSFER_NL, PlanError, plan_transfers};
use proptest::prelude::*;

const DEAD: f64 = 2.0;
const CAP: f64 = 0.5;

fn profiles() -> PlateProfiles {
    PlateProfiles::empty().with("Src", SourcePlateProfile::new("Src", DEAD, CAP, 200.0).unwrap())
}

proptest! {
    #[test]
    fn plans_conserve_volume_and_respect_limits(
        stocks in prop::collection::vec(5_u32..60, 1..4),
        demands in prop::collection::vec(1_u32..40, 1..6),
    ) {
        // whole tenths of a microliter keep every action on the nanoliter grid
        let mut source = Layout::new("S", "Src", 16, 24).unwrap();
        for (i, stock) in stocks.iter().enumerate() {
            source.add_content(WellId::new(0, i as u32), "Red", *stock as f64, None).unwrap();
        }
        let mut dest = Layout::new("D", "96", 8, 12).unwrap();
        for (i, demand) in demands.iter().enumerate() {
            dest.add_content(WellId::new(1, i as u32), "Red", *demand as f64 / 10.0, None).unwrap();
        }

        let usable: f64 = stocks.iter().map(|s| (*s as f64 - DEAD).max(0.0)).sum();
        let required: f64 = demands.iter().map(|d| *d as f64 / 10.0).sum();

        let result = plan_transfers(vec![source.clone()], std::slice::from_ref(&dest), &profiles());
        if required > usable + 1e-6 {
            prop_assert!(result.is_err());
            return Ok(());
        }
        // once the pre-flight check passes, planning must not run dry
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(PlanError::Shortfall { .. }) if required > usable - 1e-6 => return Ok(()),
            Err(err) => {
                prop_assert!(false, "planning failed after feasibility passed: {err}");
                return Ok(());
            }
        };

        let actions = outcome.transfer_lists[0].actions();
        for action in actions {
            prop_assert!(action.volume_nl() >= MIN_TRANSFER_NL);
            prop_assert!(action.volume_nl() <= 500);
        }

        let mut delivered: HashMap<WellId, u64> = HashMap::new();
        for action in actions {
            *delivered.entry(action.route().destination_well).or_default() += action.volume_nl();
        }
        for (i, demand) in demands.iter().enumerate() {
            let got = delivered.get(&WellId::new(1, i as u32)).copied().unwrap_or(0);
            prop_assert_eq!(got, *demand as u64 * 100);
        }

        for (i, _) in stocks.iter().enumerate() {
            let left = outcome.sources[0].get_volume_of_liquid_in_well("Red", WellId::new(0, i as u32));
            let initial = source.get_volume_of_liquid_in_well("Red", WellId::new(0, i as u32));
            prop_assert!(left >= DEAD.min(initial) - 1e-9);
        }
    }
}

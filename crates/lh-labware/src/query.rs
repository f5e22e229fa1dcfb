//! Read-only inventory queries across several layouts.

use indexmap::IndexSet;
use lh_core::LayoutId;

use crate::layout::Layout;
use crate::well::WellId;

/// Where a reagent was found and how much of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub layout: LayoutId,
    pub well: WellId,
    pub volume: f64,
}

/// Union of reagent names across `layouts`, in discovery order.
pub fn reagents_present(layouts: &[Layout]) -> IndexSet<String> {
    layouts.iter().flat_map(|l| l.reagents()).collect()
}

/// Every occurrence of `reagent`, layout by layout in content order.
pub fn locate(reagent: &str, layouts: &[Layout]) -> Vec<Occurrence> {
    layouts
        .iter()
        .enumerate()
        .flat_map(|(idx, layout)| {
            layout
                .get_wells_containing_liquid(reagent)
                .into_iter()
                .map(move |well| Occurrence {
                    layout: LayoutId::from_usize(idx),
                    well,
                    volume: layout.get_volume_of_liquid_in_well(reagent, well),
                })
        })
        .collect()
}

/// Total volume of `reagent` across `layouts`.
pub fn total_volume_of(reagent: &str, layouts: &[Layout]) -> f64 {
    locate(reagent, layouts).iter().map(|o| o.volume).sum()
}

//! Source inventory as an initial snapshot plus an append-only withdrawal ledger.
//!
//! Remaining volume is always derived: `initial - sum(withdrawals)`.

use std::collections::HashMap;

use indexmap::IndexMap;
use lh_core::LayoutId;
use lh_labware::{LabwareResult, Layout, WellId};

/// One reagent in one well of one source layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StockKey {
    pub source: LayoutId,
    pub well: WellId,
    pub reagent: String,
}

/// A single withdrawal, in uL.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub stock: StockKey,
    pub volume: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    initial: IndexMap<StockKey, f64>,
    ledger: Vec<Consumption>,
    consumed: HashMap<StockKey, f64>,
}

impl Inventory {
    /// Record the current content of `sources` as the initial state.
    pub fn snapshot(sources: &[Layout]) -> Self {
        let mut initial = IndexMap::new();
        for (idx, layout) in sources.iter().enumerate() {
            for (well, entries) in layout.content() {
                for entry in entries {
                    initial.insert(
                        StockKey {
                            source: LayoutId::from_usize(idx),
                            well,
                            reagent: entry.reagent.clone(),
                        },
                        entry.volume,
                    );
                }
            }
        }
        Self {
            initial,
            ledger: Vec::new(),
            consumed: HashMap::new(),
        }
    }

    pub fn initial(&self, stock: &StockKey) -> f64 {
        self.initial.get(stock).copied().unwrap_or(0.0)
    }

    pub fn consumed(&self, stock: &StockKey) -> f64 {
        self.consumed.get(stock).copied().unwrap_or(0.0)
    }

    pub fn remaining(&self, stock: &StockKey) -> f64 {
        self.initial(stock) - self.consumed(stock)
    }

    /// Append a withdrawal of `volume` uL.
    pub fn withdraw(&mut self, stock: StockKey, volume: f64) {
        *self.consumed.entry(stock.clone()).or_insert(0.0) += volume;
        self.ledger.push(Consumption { stock, volume });
    }

    pub fn ledger(&self) -> &[Consumption] {
        &self.ledger
    }

    pub fn into_ledger(self) -> Vec<Consumption> {
        self.ledger
    }

    /// Write remaining volumes of every touched stock back into `sources`.
    pub fn apply_to(&self, sources: &mut [Layout]) -> LabwareResult<()> {
        for stock in self.initial.keys().filter(|s| self.consumed.contains_key(*s)) {
            if let Some(layout) = sources.get_mut(stock.source.as_usize()) {
                let remaining = self.remaining(stock).max(0.0);
                layout.update_volume_in_well(remaining, &stock.reagent, stock.well)?;
            }
        }
        Ok(())
    }
}

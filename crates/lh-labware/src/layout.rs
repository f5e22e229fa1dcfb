//! Per-plate content model.

use indexmap::{IndexMap, IndexSet};
use lh_core::{LhError, ensure_volume};

use crate::error::{LabwareError, LabwareResult};
use crate::well::{Direction, WellId, parse_wells};

/// Liquid class used when the caller does not give one.
pub const UNKNOWN_LIQUID_CLASS: &str = "Unknown";

/// One reagent held in a well.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub reagent: String,
    /// Volume in microliters.
    pub volume: f64,
    pub liquid_class: String,
}

/// One piece of labware and everything it holds.
///
/// Content is kept in insertion order, which is also the order in which
/// wells are discovered by [`Layout::get_wells_containing_liquid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    plate_type: String,
    rows: u32,
    columns: u32,
    content: IndexMap<WellId, Vec<ContentEntry>>,
    /// Wells eligible for automatic allocation, in allocation order.
    available_wells: Option<Vec<WellId>>,
    /// Available wells that hold nothing yet.
    empty_wells: IndexSet<WellId>,
    labels: IndexMap<WellId, String>,
}

impl Layout {
    /// Create an empty layout with a `rows` x `columns` format.
    pub fn new(
        name: impl Into<String>,
        plate_type: impl Into<String>,
        rows: u32,
        columns: u32,
    ) -> LabwareResult<Self> {
        let name = name.into();
        check_format(&name, rows, columns)?;
        Ok(Self {
            name,
            plate_type: plate_type.into(),
            rows,
            columns,
            content: IndexMap::new(),
            available_wells: None,
            empty_wells: IndexSet::new(),
            labels: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plate_type(&self) -> &str {
        &self.plate_type
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Change the plate format.
    ///
    /// Fails if existing content or labels would fall outside the new format.
    /// Available wells are reset and must be set again.
    pub fn define_format(&mut self, rows: u32, columns: u32) -> LabwareResult<()> {
        check_format(&self.name, rows, columns)?;
        if let Some(well) = self
            .content
            .keys()
            .chain(self.labels.keys())
            .find(|w| !w.in_format(rows, columns))
        {
            return Err(LabwareError::WellOutOfRange {
                layout: self.name.clone(),
                well: *well,
                rows,
                columns,
            });
        }
        self.rows = rows;
        self.columns = columns;
        self.available_wells = None;
        self.empty_wells.clear();
        Ok(())
    }

    /// Compute and freeze the ordered list of wells used for allocation.
    ///
    /// `use_outer_wells == false` drops the first and last row and column.
    pub fn set_available_wells(
        &mut self,
        range: &str,
        use_outer_wells: bool,
        direction: Direction,
        boxed: bool,
    ) -> LabwareResult<()> {
        if self.available_wells.is_some() {
            return Err(LabwareError::AvailableWellsFrozen {
                layout: self.name.clone(),
            });
        }
        let (rows, columns) = (self.rows, self.columns);
        let wells: Vec<WellId> = parse_wells(range, rows, columns, direction, boxed)?
            .into_iter()
            .filter(|w| {
                use_outer_wells
                    || (w.row() > 0
                        && w.row() + 1 < rows
                        && w.column() > 0
                        && w.column() + 1 < columns)
            })
            .collect();

        self.empty_wells = wells
            .iter()
            .filter(|w| !self.content.contains_key(*w))
            .copied()
            .collect();
        self.available_wells = Some(wells);
        Ok(())
    }

    pub fn available_wells(&self) -> Option<&[WellId]> {
        self.available_wells.as_deref()
    }

    /// Available wells still without content, in allocation order.
    pub fn empty_wells(&self) -> Vec<WellId> {
        self.available_wells
            .iter()
            .flatten()
            .filter(|w| self.empty_wells.contains(*w))
            .copied()
            .collect()
    }

    /// Add `volume` uL of `reagent` to `well`.
    ///
    /// A reagent already present in the well has its volume increased.
    pub fn add_content(
        &mut self,
        well: WellId,
        reagent: &str,
        volume: f64,
        liquid_class: Option<&str>,
    ) -> LabwareResult<()> {
        self.check_target(well)?;
        let volume = self.check_volume(volume, reagent, well)?;

        let entries = self.content.entry(well).or_default();
        match entries.iter_mut().find(|e| e.reagent == reagent) {
            Some(entry) => {
                entry.volume += volume;
                if let Some(class) = liquid_class {
                    if entry.liquid_class == UNKNOWN_LIQUID_CLASS {
                        entry.liquid_class = class.to_string();
                    }
                }
            }
            None => entries.push(ContentEntry {
                reagent: reagent.to_string(),
                volume,
                liquid_class: liquid_class.unwrap_or(UNKNOWN_LIQUID_CLASS).to_string(),
            }),
        }
        self.empty_wells.shift_remove(&well);
        Ok(())
    }

    /// Add the same content to each of `wells`. Nothing is written unless
    /// every well accepts it.
    pub fn add_content_to_wells(
        &mut self,
        wells: &[WellId],
        reagent: &str,
        volume: f64,
        liquid_class: Option<&str>,
    ) -> LabwareResult<()> {
        for &well in wells {
            self.check_target(well)?;
            self.check_volume(volume, reagent, well)?;
        }
        for &well in wells {
            self.add_content(well, reagent, volume, liquid_class)?;
        }
        Ok(())
    }

    /// Add the same content to every well of a range specification.
    pub fn add_content_to_range(
        &mut self,
        range: &str,
        reagent: &str,
        volume: f64,
        liquid_class: Option<&str>,
    ) -> LabwareResult<()> {
        let wells = parse_wells(range, self.rows, self.columns, Direction::Horizontal, false)?;
        self.add_content_to_wells(&wells, reagent, volume, liquid_class)
    }

    /// Wells holding `reagent`, in content order.
    pub fn get_wells_containing_liquid(&self, reagent: &str) -> Vec<WellId> {
        self.content
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.reagent == reagent))
            .map(|(well, _)| *well)
            .collect()
    }

    /// Volume of `reagent` in `well`, `0.0` when absent.
    pub fn get_volume_of_liquid_in_well(&self, reagent: &str, well: WellId) -> f64 {
        self.entry(reagent, well).map_or(0.0, |e| e.volume)
    }

    /// Overwrite the stored volume of `reagent` in `well`.
    ///
    /// The well must already hold something. A reagent not yet in the well is
    /// appended with the unknown liquid class.
    pub fn update_volume_in_well(
        &mut self,
        volume: f64,
        reagent: &str,
        well: WellId,
    ) -> LabwareResult<()> {
        let volume = self.check_volume(volume, reagent, well)?;
        let Some(entries) = self.content.get_mut(&well) else {
            return Err(LabwareError::NoContent {
                layout: self.name.clone(),
                well,
            });
        };
        match entries.iter_mut().find(|e| e.reagent == reagent) {
            Some(entry) => entry.volume = volume,
            None => entries.push(ContentEntry {
                reagent: reagent.to_string(),
                volume,
                liquid_class: UNKNOWN_LIQUID_CLASS.to_string(),
            }),
        }
        Ok(())
    }

    /// First available well that is still empty.
    pub fn get_next_empty_well(&self) -> LabwareResult<Option<WellId>> {
        let available = self
            .available_wells
            .as_ref()
            .ok_or_else(|| LabwareError::AvailableWellsNotSet {
                layout: self.name.clone(),
            })?;
        Ok(available
            .iter()
            .find(|w| self.empty_wells.contains(*w))
            .copied())
    }

    /// Remove one reagent from a well. A well left without content becomes empty again.
    pub fn clear_liquid_in_well(&mut self, well: WellId, reagent: &str) -> LabwareResult<()> {
        self.check_well(well)?;
        let now_empty = match self.content.get_mut(&well) {
            Some(entries) => {
                entries.retain(|e| e.reagent != reagent);
                entries.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.release_well(well);
        }
        Ok(())
    }

    /// Remove everything held in a well.
    pub fn clear_content_from_well(&mut self, well: WellId) -> LabwareResult<()> {
        self.check_well(well)?;
        if self.content.contains_key(&well) {
            self.release_well(well);
        }
        Ok(())
    }

    /// Entries of a well (empty slice for an empty well).
    pub fn entries(&self, well: WellId) -> &[ContentEntry] {
        self.content.get(&well).map_or(&[], |e| e.as_slice())
    }

    /// All wells with content and their entries, in content order.
    pub fn content(&self) -> impl Iterator<Item = (WellId, &[ContentEntry])> {
        self.content.iter().map(|(w, e)| (*w, e.as_slice()))
    }

    pub fn entry(&self, reagent: &str, well: WellId) -> Option<&ContentEntry> {
        self.content
            .get(&well)
            .and_then(|entries| entries.iter().find(|e| e.reagent == reagent))
    }

    pub fn liquid_class_of(&self, reagent: &str, well: WellId) -> Option<&str> {
        self.entry(reagent, well).map(|e| e.liquid_class.as_str())
    }

    /// Sum of all reagent volumes in a well.
    pub fn total_volume_in_well(&self, well: WellId) -> f64 {
        self.entries(well).iter().map(|e| e.volume).sum()
    }

    /// Names of every reagent present, in discovery order.
    pub fn reagents(&self) -> IndexSet<String> {
        self.content
            .values()
            .flatten()
            .map(|e| e.reagent.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Attach a human label to a well. Labels are unique within a layout.
    pub fn set_well_label(&mut self, well: WellId, label: impl Into<String>) -> LabwareResult<()> {
        self.check_well(well)?;
        let label = label.into();
        if let Some(other) = self.well_for_label(&label) {
            if other != well {
                return Err(LabwareError::DuplicateLabel {
                    layout: self.name.clone(),
                    label,
                    well: other,
                });
            }
        }
        self.labels.insert(well, label);
        Ok(())
    }

    pub fn label_of(&self, well: WellId) -> Option<&str> {
        self.labels.get(&well).map(String::as_str)
    }

    pub fn well_for_label(&self, label: &str) -> Option<WellId> {
        self.labels
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(w, _)| *w)
    }

    /// Copy of this layout keeping only entries for which `keep` is true.
    pub fn filtered(&self, keep: impl Fn(&ContentEntry) -> bool) -> Layout {
        let mut copy = self.clone();
        let mut emptied = Vec::new();
        for (well, entries) in copy.content.iter_mut() {
            entries.retain(|e| keep(e));
            if entries.is_empty() {
                emptied.push(*well);
            }
        }
        for well in emptied {
            copy.release_well(well);
        }
        copy
    }

    /// Same format and available wells, no content or labels.
    pub fn clone_empty(&self, name: impl Into<String>) -> Layout {
        Layout {
            name: name.into(),
            plate_type: self.plate_type.clone(),
            rows: self.rows,
            columns: self.columns,
            content: IndexMap::new(),
            empty_wells: self.available_wells.iter().flatten().copied().collect(),
            available_wells: self.available_wells.clone(),
            labels: IndexMap::new(),
        }
    }

    fn release_well(&mut self, well: WellId) {
        self.content.shift_remove(&well);
        if self
            .available_wells
            .as_ref()
            .is_some_and(|available| available.contains(&well))
        {
            self.empty_wells.insert(well);
        }
    }

    fn check_well(&self, well: WellId) -> LabwareResult<()> {
        if well.in_format(self.rows, self.columns) {
            Ok(())
        } else {
            Err(LabwareError::WellOutOfRange {
                layout: self.name.clone(),
                well,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// In format and, once available wells are set, one of them.
    fn check_target(&self, well: WellId) -> LabwareResult<()> {
        self.check_well(well)?;
        match &self.available_wells {
            Some(available) if !available.contains(&well) => {
                Err(LabwareError::WellNotAvailable {
                    layout: self.name.clone(),
                    well,
                })
            }
            _ => Ok(()),
        }
    }

    fn check_volume(&self, volume: f64, reagent: &str, well: WellId) -> LabwareResult<f64> {
        ensure_volume(volume, "well volume").map_err(|err| match err {
            LhError::Negative { value, .. } => LabwareError::NegativeVolume {
                reagent: reagent.to_string(),
                well,
                volume: value,
            },
            other => LabwareError::Numeric(other),
        })
    }
}

fn check_format(layout: &str, rows: u32, columns: u32) -> LabwareResult<()> {
    if rows == 0 || columns == 0 {
        return Err(LabwareError::InvalidFormat {
            layout: layout.to_string(),
            reason: format!("{rows}x{columns} has no wells"),
        });
    }
    Ok(())
}

//! Well identifiers and well-range parsing.
//!
//! A well id is written `<Row><Column>`: the row is an uppercase letter
//! sequence (`A`..`Z`, then `AA`, `AB`, ...) and the column a 1-based integer.
//! Ranges are `start:end` (or `start-end`), several items may be joined
//! with commas.

use core::fmt;
use std::str::FromStr;

use indexmap::IndexSet;

use crate::error::{LabwareError, LabwareResult};

/// Position of a well on a plate, stored 0-based.
///
/// Ordering is row-major (`A1 < A2 < B1`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellId {
    row: u32,
    column: u32,
}

impl WellId {
    /// Build from 0-based row and column.
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// 0-based row.
    pub fn row(self) -> u32 {
        self.row
    }

    /// 0-based column.
    pub fn column(self) -> u32 {
        self.column
    }

    /// Row letters, e.g. `A`, `P`, `AF`.
    pub fn row_label(self) -> String {
        let mut n = self.row as u64 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        String::from_utf8(letters).unwrap_or_default()
    }

    /// True when the well lies inside a `rows` x `columns` plate.
    pub fn in_format(self, rows: u32, columns: u32) -> bool {
        self.row < rows && self.column < columns
    }

    fn ordinal(self, rows: u32, columns: u32, direction: Direction) -> u64 {
        match direction {
            Direction::Horizontal => self.row as u64 * columns as u64 + self.column as u64,
            Direction::Vertical => self.column as u64 * rows as u64 + self.row as u64,
        }
    }

    fn from_ordinal(ordinal: u64, rows: u32, columns: u32, direction: Direction) -> Self {
        match direction {
            Direction::Horizontal => Self::new(
                (ordinal / columns as u64) as u32,
                (ordinal % columns as u64) as u32,
            ),
            Direction::Vertical => Self::new(
                (ordinal % rows as u64) as u32,
                (ordinal / rows as u64) as u32,
            ),
        }
    }
}

impl fmt::Debug for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WellId({self})")
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column + 1)
    }
}

impl FromStr for WellId {
    type Err = LabwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LabwareError::MalformedWell {
            well: s.to_string(),
        };
        let text = s.trim();
        let split = text
            .find(|c: char| !c.is_ascii_uppercase())
            .ok_or_else(malformed)?;
        let (letters, digits) = text.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let mut row: u32 = 0;
        for b in letters.bytes() {
            row = row
                .checked_mul(26)
                .and_then(|r| r.checked_add((b - b'A') as u32 + 1))
                .ok_or_else(malformed)?;
        }
        let column: u32 = digits.parse().map_err(|_| malformed())?;
        if column == 0 {
            return Err(malformed());
        }
        Ok(Self::new(row - 1, column - 1))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for WellId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for WellId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Traversal order of a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Row-major: A1, A2, ..., B1.
    #[default]
    Horizontal,
    /// Column-major: A1, B1, ..., A2.
    Vertical,
}

/// Every well of a plate in traversal order.
pub fn all_wells(rows: u32, columns: u32, direction: Direction) -> Vec<WellId> {
    let total = rows as u64 * columns as u64;
    (0..total)
        .map(|o| WellId::from_ordinal(o, rows, columns, direction))
        .collect()
}

/// Expand a well-range specification into an ordered, de-duplicated list.
///
/// With `boxed == false` a range `start:end` reads across the whole plate
/// in `direction` order from `start` to `end`. With `boxed == true` it is the
/// literal rectangle spanned by the two corners, traversed in `direction`.
pub fn parse_wells(
    ranges: &str,
    rows: u32,
    columns: u32,
    direction: Direction,
    boxed: bool,
) -> LabwareResult<Vec<WellId>> {
    let malformed = |reason: &str| LabwareError::MalformedRange {
        range: ranges.to_string(),
        reason: reason.to_string(),
    };
    let check = |well: WellId| {
        if well.in_format(rows, columns) {
            Ok(well)
        } else {
            Err(malformed(&format!(
                "well {well} outside {rows}x{columns} format"
            )))
        }
    };

    let mut wells: IndexSet<WellId> = IndexSet::new();
    for item in ranges.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(malformed("empty item"));
        }
        let mut ends = item.split([':', '-']);
        let start = ends.next().unwrap_or_default();
        let end = ends.next();
        if ends.next().is_some() {
            return Err(malformed("too many range separators"));
        }

        let start = check(start.parse::<WellId>()?)?;
        let Some(end) = end else {
            wells.insert(start);
            continue;
        };
        let end = check(end.parse::<WellId>()?)?;

        if boxed {
            let (r0, r1) = (start.row.min(end.row), start.row.max(end.row));
            let (c0, c1) = (start.column.min(end.column), start.column.max(end.column));
            wells.extend(
                all_wells(rows, columns, direction)
                    .into_iter()
                    .filter(|w| (r0..=r1).contains(&w.row) && (c0..=c1).contains(&w.column)),
            );
        } else {
            let first = start.ordinal(rows, columns, direction);
            let last = end.ordinal(rows, columns, direction);
            if first > last {
                return Err(malformed("range end precedes start"));
            }
            wells.extend(
                (first..=last).map(|o| WellId::from_ordinal(o, rows, columns, direction)),
            );
        }
    }
    Ok(wells.into_iter().collect())
}

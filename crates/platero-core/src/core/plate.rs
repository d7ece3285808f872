use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

/// Row letters of a 96-well plate, top to bottom.
pub const ROWS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
/// Number of columns of a 96-well plate.
pub const COLUMNS: u8 = 12;
/// Number of columns in each mirrored half of the plate.
pub const HALF_COLUMNS: u8 = COLUMNS / 2;
/// Total number of wells.
pub const WELL_COUNT: usize = ROWS.len() * COLUMNS as usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WellAddressError {
    #[error("Invalid row '{0}', expected a letter between A and H")]
    InvalidRow(char),
    #[error("Invalid column {0}, expected a number between 1 and 12")]
    InvalidColumn(u8),
    #[error("Malformed well address '{0}'")]
    Malformed(String),
}

/// Address of a single well, e.g. `A1` or `H12`.
///
/// Only the 96 addresses of the fixed 8x12 layout can be constructed. The derived ordering
/// is row-major (`A1 < A2 < ... < A12 < B1`), which is also the iteration order of
/// [`PlateGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellAddress {
    row: u8,
    column: u8,
}

impl WellAddress {
    pub fn new(row: char, column: u8) -> Result<Self, WellAddressError> {
        let row_upper = row.to_ascii_uppercase();
        let row_index = ROWS
            .iter()
            .position(|&r| r == row_upper)
            .ok_or(WellAddressError::InvalidRow(row))?;
        if column == 0 || column > COLUMNS {
            return Err(WellAddressError::InvalidColumn(column));
        }
        Ok(Self {
            row: row_index as u8,
            column,
        })
    }

    /// Builds an address from 0-based row and column indices.
    pub fn from_indices(row_index: usize, column_index: usize) -> Option<Self> {
        if row_index < ROWS.len() && column_index < COLUMNS as usize {
            Some(Self {
                row: row_index as u8,
                column: column_index as u8 + 1,
            })
        } else {
            None
        }
    }

    /// Builds an address from its position in row-major order (0..96).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::from_indices(index / COLUMNS as usize, index % COLUMNS as usize)
    }

    /// All 96 addresses in row-major order: `A1..A12, B1..B12, ..., H1..H12`.
    pub fn all() -> impl Iterator<Item = WellAddress> {
        (0..WELL_COUNT).filter_map(Self::from_index)
    }

    pub fn row(&self) -> char {
        ROWS[self.row as usize]
    }

    pub fn row_index(&self) -> usize {
        self.row as usize
    }

    /// 1-based column number.
    pub fn column(&self) -> u8 {
        self.column
    }

    /// Position in row-major order.
    pub fn index(&self) -> usize {
        self.row as usize * COLUMNS as usize + (self.column as usize - 1)
    }

    /// Index of the negative-control group calibrating this well. Each group spans
    /// [`HALF_COLUMNS`] consecutive columns.
    pub fn control_group(&self) -> usize {
        (self.column as usize - 1) / HALF_COLUMNS as usize
    }

    pub fn is_left_half(&self) -> bool {
        self.column <= HALF_COLUMNS
    }

    /// The well at the same row in the other half of the plate.
    pub fn mirror(&self) -> WellAddress {
        let column = if self.is_left_half() {
            self.column + HALF_COLUMNS
        } else {
            self.column - HALF_COLUMNS
        };
        Self {
            row: self.row,
            column,
        }
    }

    /// The position this well ends up in when the plate is turned 180 degrees.
    pub fn rotated(&self) -> WellAddress {
        Self {
            row: (ROWS.len() - 1) as u8 - self.row,
            column: COLUMNS + 1 - self.column,
        }
    }
}

impl fmt::Display for WellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row(), self.column)
    }
}

impl FromStr for WellAddress {
    type Err = WellAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let row = chars
            .next()
            .ok_or_else(|| WellAddressError::Malformed(s.to_string()))?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WellAddressError::Malformed(s.to_string()));
        }
        let column: u8 = digits
            .parse()
            .map_err(|_| WellAddressError::Malformed(s.to_string()))?;
        Self::new(row, column)
    }
}

/// Negative-control group index of a textual well id, e.g. `"A7"` -> 1.
pub fn control_index(cell: &str) -> Result<usize, WellAddressError> {
    cell.parse::<WellAddress>().map(|address| address.control_group())
}

/// A value for every one of the 96 wells of a plate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateGrid<T> {
    wells: Vec<T>,
}

impl<T: Default> PlateGrid<T> {
    pub fn new() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T: Default> Default for PlateGrid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PlateGrid<T> {
    pub fn from_fn(mut f: impl FnMut(WellAddress) -> T) -> Self {
        Self {
            wells: WellAddress::all().map(&mut f).collect(),
        }
    }

    /// Builds a grid from exactly 96 values given in row-major order.
    pub fn from_row_major(values: Vec<T>) -> Option<Self> {
        (values.len() == WELL_COUNT).then_some(Self { wells: values })
    }

    pub fn get(&self, address: WellAddress) -> &T {
        &self.wells[address.index()]
    }

    pub fn get_mut(&mut self, address: WellAddress) -> &mut T {
        &mut self.wells[address.index()]
    }

    pub fn set(&mut self, address: WellAddress, value: T) {
        self.wells[address.index()] = value;
    }

    /// Iterates over all wells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (WellAddress, &T)> {
        WellAddress::all().zip(self.wells.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.wells.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(WellAddress, &T) -> U) -> PlateGrid<U> {
        PlateGrid {
            wells: self.iter().map(|(address, value)| f(address, value)).collect(),
        }
    }

    /// Values of one row (`row_index` 0..8), column 1 first.
    pub fn row(&self, row_index: usize) -> &[T] {
        let start = row_index * COLUMNS as usize;
        &self.wells[start..start + COLUMNS as usize]
    }
}

impl<T: Clone> PlateGrid<T> {
    pub fn filled(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }

    /// The layout seen by the reader when the plate was loaded turned 180 degrees.
    pub fn rotated(&self) -> Self {
        Self::from_fn(|address| self.get(address.rotated()).clone())
    }
}

impl<T> Index<WellAddress> for PlateGrid<T> {
    type Output = T;

    fn index(&self, address: WellAddress) -> &T {
        self.get(address)
    }
}

impl<T> IndexMut<WellAddress> for PlateGrid<T> {
    fn index_mut(&mut self, address: WellAddress) -> &mut T {
        self.get_mut(address)
    }
}

impl<T: fmt::Display> fmt::Display for PlateGrid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in 1..=COLUMNS {
            write!(f, "\t{}", column)?;
        }
        writeln!(f)?;
        for (row_index, row) in ROWS.iter().enumerate() {
            write!(f, "{}", row)?;
            for value in self.row(row_index) {
                write!(f, "\t{}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

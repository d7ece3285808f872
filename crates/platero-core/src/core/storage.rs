use super::plate::{COLUMNS, HALF_COLUMNS, PlateGrid, ROWS, WELL_COUNT, WellAddress};
use super::protein::ProteinRef;
use thiserror::Error;

/// Proteins a prey storage plate can hold: one per well of a half plate, minus the two
/// wells of each half reserved for controls.
pub const PREY_STORAGE_CAPACITY: usize = WELL_COUNT / 2 - 2;
/// Proteins a bait storage plate can hold: one per column.
pub const BAIT_STORAGE_CAPACITY: usize = COLUMNS as usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("No {kind} proteins provided to lay out the plate")]
    Empty { kind: &'static str },
    #[error("Plate can only hold up to {capacity} {kind} proteins, {given} provided")]
    Exceeded {
        kind: &'static str,
        capacity: usize,
        given: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Prey,
    Bait,
}

impl StorageKind {
    /// Value of the `Plate type` template field.
    pub fn plate_type(&self) -> &'static str {
        match self {
            StorageKind::Prey => "Prey storage",
            StorageKind::Bait => "Bait storage",
        }
    }
}

/// Which protein occupies each well of a physical storage plate.
#[derive(Debug, Clone, PartialEq)]
pub struct StoragePlate {
    name: String,
    kind: StorageKind,
    proteins: Vec<ProteinRef>,
    wells: PlateGrid<Option<ProteinRef>>,
}

impl StoragePlate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Proteins in the order they were laid out.
    pub fn proteins(&self) -> &[ProteinRef] {
        &self.proteins
    }

    pub fn wells(&self) -> &PlateGrid<Option<ProteinRef>> {
        &self.wells
    }

    pub fn get(&self, address: WellAddress) -> Option<&ProteinRef> {
        self.wells.get(address).as_ref()
    }
}

/// A storage plate holding the prey proteins of a batch twice: once in the left half
/// (columns 1-6) and once in the right half (columns 7-12), column-major in each half.
#[derive(Debug, Clone, PartialEq)]
pub struct PreyStoragePlate(StoragePlate);

impl PreyStoragePlate {
    pub fn new(preys: &[ProteinRef]) -> Result<Self, CapacityError> {
        check_capacity("prey", preys.len(), PREY_STORAGE_CAPACITY)?;

        let mut wells = PlateGrid::new();
        for (i, protein) in preys.iter().enumerate() {
            let row_index = i % ROWS.len();
            let left_column = i / ROWS.len();
            if let Some(left) = WellAddress::from_indices(row_index, left_column) {
                wells.set(left, Some(protein.clone()));
                wells.set(left.mirror(), Some(protein.clone()));
            }
        }

        Ok(Self(StoragePlate {
            name: String::new(),
            kind: StorageKind::Prey,
            proteins: preys.to_vec(),
            wells,
        }))
    }

    pub fn capacity() -> usize {
        PREY_STORAGE_CAPACITY
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.0.name = name.into();
        self
    }

    pub fn plate(&self) -> &StoragePlate {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn get(&self, address: WellAddress) -> Option<&ProteinRef> {
        self.0.get(address)
    }
}

/// A storage plate with one bait protein per column, filling all eight rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BaitStoragePlate(StoragePlate);

impl BaitStoragePlate {
    pub fn new(baits: &[ProteinRef]) -> Result<Self, CapacityError> {
        check_capacity("bait", baits.len(), BAIT_STORAGE_CAPACITY)?;

        let mut wells = PlateGrid::new();
        for (column_index, protein) in baits.iter().enumerate() {
            for row_index in 0..ROWS.len() {
                if let Some(address) = WellAddress::from_indices(row_index, column_index) {
                    wells.set(address, Some(protein.clone()));
                }
            }
        }

        Ok(Self(StoragePlate {
            name: String::new(),
            kind: StorageKind::Bait,
            proteins: baits.to_vec(),
            wells,
        }))
    }

    pub fn capacity() -> usize {
        BAIT_STORAGE_CAPACITY
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.0.name = name.into();
        self
    }

    pub fn plate(&self) -> &StoragePlate {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn get(&self, address: WellAddress) -> Option<&ProteinRef> {
        self.0.get(address)
    }
}

/// 1-based bait storage plate holding the protein at `batch_offset` of its batch.
pub fn bait_plate_index(batch_offset: usize) -> usize {
    batch_offset / BAIT_STORAGE_CAPACITY + 1
}

/// 0-based column of the protein at `batch_offset` within its bait storage plate.
pub fn bait_plate_offset(batch_offset: usize) -> usize {
    batch_offset % BAIT_STORAGE_CAPACITY
}

fn check_capacity(kind: &'static str, given: usize, capacity: usize) -> Result<(), CapacityError> {
    if given == 0 {
        return Err(CapacityError::Empty { kind });
    }
    if given > capacity {
        return Err(CapacityError::Exceeded {
            kind,
            capacity,
            given,
        });
    }
    Ok(())
}

const _: () = assert!(PREY_STORAGE_CAPACITY <= ROWS.len() * HALF_COLUMNS as usize);

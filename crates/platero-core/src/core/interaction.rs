use super::plate::WellAddress;
use super::protein::ProteinRef;
use super::screen::DELIMITER;
use std::fmt;

/// One measured bait/prey well of a screen plate, with the values derived from it.
///
/// Derived values start out as `None` and are filled in by normalization and
/// aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub plate_id: u32,
    pub plate_cell: WellAddress,
    pub bait: ProteinRef,
    pub prey: ProteinRef,
    pub raw_value: f64,
    pub control_group: usize,
    /// Mean of the negative controls of `control_group`.
    pub control_mean: Option<f64>,
    pub normalized_value: Option<f64>,
    pub z_score_global: Option<f64>,
    pub z_score_plate: Option<f64>,
}

impl InteractionRecord {
    pub fn new(
        plate_id: u32,
        plate_cell: WellAddress,
        bait: ProteinRef,
        prey: ProteinRef,
        raw_value: f64,
    ) -> Self {
        Self {
            plate_id,
            plate_cell,
            bait,
            prey,
            raw_value,
            control_group: plate_cell.control_group(),
            control_mean: None,
            normalized_value: None,
            z_score_global: None,
            z_score_plate: None,
        }
    }

    pub fn key(&self) -> InteractionKey {
        InteractionKey::new(&self.bait, &self.prey)
    }
}

/// Identity of a bait x prey combination, independent of the plate it was measured on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionKey(String);

impl InteractionKey {
    pub fn new(bait: &ProteinRef, prey: &ProteinRef) -> Self {
        Self(format!("{}{}{}", bait.id, DELIMITER, prey.id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping key of a crosstab axis: `(family, subfamily, label)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProteinKey {
    pub family: String,
    pub subfamily: String,
    pub label: String,
}

impl From<&ProteinRef> for ProteinKey {
    fn from(protein: &ProteinRef) -> Self {
        Self {
            family: protein.family.clone(),
            subfamily: protein.subfamily.clone(),
            label: protein.label.clone(),
        }
    }
}

/// Prey x bait matrix of normalized values.
#[derive(Debug, Clone, PartialEq)]
pub struct Crosstab {
    /// Prey keys, one per row, sorted.
    pub rows: Vec<ProteinKey>,
    /// Bait keys, one per column, sorted.
    pub columns: Vec<ProteinKey>,
    /// `values[row][column]`; combinations never measured hold `0.0`.
    pub values: Vec<Vec<f64>>,
    /// Number of combinations that were never measured.
    pub missing: usize,
}

impl Crosstab {
    pub fn get(&self, prey: &ProteinKey, bait: &ProteinKey) -> Option<f64> {
        let row = self.rows.binary_search(prey).ok()?;
        let column = self.columns.binary_search(bait).ok()?;
        Some(self.values[row][column])
    }
}

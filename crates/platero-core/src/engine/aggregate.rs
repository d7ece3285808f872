use super::error::EngineError;
use super::normalize::assign_global_z_scores;
use crate::core::interaction::{Crosstab, InteractionKey, InteractionRecord, ProteinKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// A bait x prey combination measured more than once across the merged plates.
///
/// Duplicates are kept in the dataset; the crosstab averages them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateInteractionWarning {
    pub key: InteractionKey,
    /// Plate id of every occurrence, in dataset order.
    pub plates: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZScoreBasis {
    Global,
    PerPlate,
}

impl ZScoreBasis {
    fn score(&self, record: &InteractionRecord) -> Option<f64> {
        match self {
            ZScoreBasis::Global => record.z_score_global,
            ZScoreBasis::PerPlate => record.z_score_plate,
        }
    }
}

/// Interaction records of every processed plate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<InteractionRecord>,
    pub duplicates: Vec<DuplicateInteractionWarning>,
}

impl Dataset {
    /// Concatenates per-plate records, tagging them with their plate id, and computes the
    /// global Z-scores over the result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientData`] when fewer than two records are merged or
    /// their normalized values do not vary.
    pub fn merge(
        plates: impl IntoIterator<Item = (u32, Vec<InteractionRecord>)>,
    ) -> Result<Self, EngineError> {
        let mut records = Vec::new();
        for (plate_id, plate_records) in plates {
            records.extend(plate_records.into_iter().map(|mut record| {
                record.plate_id = plate_id;
                record
            }));
        }

        assign_global_z_scores(&mut records)?;

        let duplicates = find_duplicates(&records);
        if !duplicates.is_empty() {
            warn!(
                "{} interaction(s) were screened more than once: {}",
                duplicates.len(),
                duplicates
                    .iter()
                    .map(|d| d.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(Self {
            records,
            duplicates,
        })
    }

    pub fn crosstab(&self) -> Crosstab {
        crosstab(&self.records)
    }

    /// Copy of the records where every normalized value whose Z-score on `basis` is below
    /// `multiplier` is set to zero.
    pub fn thresholded(&self, multiplier: f64, basis: ZScoreBasis) -> Vec<InteractionRecord> {
        self.records
            .iter()
            .cloned()
            .map(|mut record| {
                if basis.score(&record).is_none_or(|z| z < multiplier) {
                    record.normalized_value = Some(0.0);
                }
                record
            })
            .collect()
    }
}

fn find_duplicates(records: &[InteractionRecord]) -> Vec<DuplicateInteractionWarning> {
    let mut occurrences: BTreeMap<InteractionKey, Vec<u32>> = BTreeMap::new();
    for record in records {
        occurrences.entry(record.key()).or_default().push(record.plate_id);
    }
    occurrences
        .into_iter()
        .filter(|(_, plates)| plates.len() > 1)
        .map(|(key, plates)| DuplicateInteractionWarning { key, plates })
        .collect()
}

/// Pivots records into a prey x bait matrix of normalized values.
///
/// Repeated combinations are averaged; combinations never measured hold `0.0` and are
/// counted in [`Crosstab::missing`].
pub fn crosstab(records: &[InteractionRecord]) -> Crosstab {
    let mut cells: BTreeMap<(ProteinKey, ProteinKey), (f64, usize)> = BTreeMap::new();
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();

    for record in records {
        let prey = ProteinKey::from(&record.prey);
        let bait = ProteinKey::from(&record.bait);
        rows.insert(prey.clone());
        columns.insert(bait.clone());
        let cell = cells.entry((prey, bait)).or_insert((0.0, 0));
        cell.0 += record.normalized_value.unwrap_or_default();
        cell.1 += 1;
    }

    let rows: Vec<ProteinKey> = rows.into_iter().collect();
    let columns: Vec<ProteinKey> = columns.into_iter().collect();
    let mut missing = 0;
    let values: Vec<Vec<f64>> = rows
        .iter()
        .map(|prey| {
            columns
                .iter()
                .map(|bait| match cells.get(&(prey.clone(), bait.clone())) {
                    Some((sum, count)) => sum / *count as f64,
                    None => {
                        missing += 1;
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    if missing > 0 {
        info!(
            "{} of {} bait x prey combinations were not measured and are filled with 0",
            missing,
            rows.len() * columns.len()
        );
    }

    Crosstab {
        rows,
        columns,
        values,
        missing,
    }
}

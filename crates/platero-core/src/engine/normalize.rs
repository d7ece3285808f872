use super::error::EngineError;
use super::interpret::PlateReadout;
use crate::core::interaction::InteractionRecord;
use std::collections::BTreeMap;
use tracing::debug;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 in the denominator); `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Standard scores of `values` against their own mean and sample standard deviation.
pub fn z_scores(values: &[f64]) -> Result<Vec<f64>, EngineError> {
    let std_dev = sample_std_dev(values).ok_or_else(|| {
        EngineError::InsufficientData(format!(
            "{} interaction value(s), at least 2 are needed for Z-scores",
            values.len()
        ))
    })?;
    if std_dev == 0.0 {
        return Err(EngineError::InsufficientData(format!(
            "all {} interaction values are identical; a zero standard deviation leaves \
             Z-scores undefined even with at least 2 values",
            values.len()
        )));
    }
    let mean = mean(values).unwrap_or_default();
    Ok(values.iter().map(|v| (v - mean) / std_dev).collect())
}

pub fn control_means(controls: &BTreeMap<usize, Vec<f64>>) -> BTreeMap<usize, f64> {
    controls
        .iter()
        .filter_map(|(group, reads)| mean(reads).map(|m| (*group, m)))
        .collect()
}

/// Divides each raw value by the mean negative control of its group.
pub fn normalize(
    records: &mut [InteractionRecord],
    control_means: &BTreeMap<usize, f64>,
) -> Result<(), EngineError> {
    for record in records.iter_mut() {
        let control = control_means
            .get(&record.control_group)
            .copied()
            .filter(|m| *m != 0.0)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "{}: no usable negative control for group {}",
                    record.plate_cell, record.control_group
                ))
            })?;
        record.control_mean = Some(control);
        record.normalized_value = Some(record.raw_value / control);
    }
    Ok(())
}

fn normalized_values(records: &[InteractionRecord]) -> Result<Vec<f64>, EngineError> {
    records
        .iter()
        .map(|r| {
            r.normalized_value.ok_or_else(|| {
                EngineError::Internal(format!(
                    "record at {} of plate {} was not normalized",
                    r.plate_cell, r.plate_id
                ))
            })
        })
        .collect()
}

pub fn assign_plate_z_scores(records: &mut [InteractionRecord]) -> Result<(), EngineError> {
    let scores = z_scores(&normalized_values(records)?)?;
    for (record, z) in records.iter_mut().zip(scores) {
        record.z_score_plate = Some(z);
    }
    Ok(())
}

pub fn assign_global_z_scores(records: &mut [InteractionRecord]) -> Result<(), EngineError> {
    let scores = z_scores(&normalized_values(records)?)?;
    for (record, z) in records.iter_mut().zip(scores) {
        record.z_score_global = Some(z);
    }
    Ok(())
}

/// Normalizes one interpreted plate and scores it against itself.
pub fn normalize_plate(readout: &mut PlateReadout) -> Result<(), EngineError> {
    let means = control_means(&readout.controls);
    debug!("Negative control means by group: {:?}", means);
    normalize(&mut readout.records, &means)?;
    assign_plate_z_scores(&mut readout.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protein::ProteinRef;

    const EPS: f64 = 1e-3;

    fn record(cell: &str, raw: f64) -> InteractionRecord {
        InteractionRecord::new(
            1,
            cell.parse().unwrap(),
            ProteinRef::with_id("B1"),
            ProteinRef::with_id(format!("P{}", cell)),
            raw,
        )
    }

    #[test]
    fn raw_value_is_divided_by_the_group_control_mean() {
        let mut controls = BTreeMap::new();
        controls.insert(0, vec![10.0; 6]);
        let mut records = vec![record("A1", 20.0)];

        normalize(&mut records, &control_means(&controls)).unwrap();

        assert_eq!(records[0].control_mean, Some(10.0));
        assert_eq!(records[0].normalized_value, Some(2.0));
    }

    #[test]
    fn z_score_uses_sample_standard_deviation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sample_std_dev(&values).unwrap() - 1.581).abs() < EPS);
        let scores = z_scores(&values).unwrap();
        assert!((scores[4] - 1.265).abs() < EPS);
        assert!(scores[2].abs() < EPS);
    }

    #[test]
    fn too_few_or_constant_values_are_insufficient() {
        assert!(matches!(z_scores(&[1.0]), Err(EngineError::InsufficientData(_))));
        assert!(matches!(z_scores(&[]), Err(EngineError::InsufficientData(_))));
        match z_scores(&[2.0, 2.0, 2.0]) {
            Err(EngineError::InsufficientData(message)) => {
                assert!(message.contains("all 3 interaction values are identical"), "{}", message);
                assert!(message.contains("zero standard deviation"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn records_without_a_control_group_are_rejected() {
        let mut records = vec![record("A7", 20.0)];
        let mut means = BTreeMap::new();
        means.insert(0, 10.0);
        assert!(matches!(
            normalize(&mut records, &means),
            Err(EngineError::Validation(message)) if message.starts_with("A7")
        ));
    }

    #[test]
    fn plate_is_normalized_and_scored() {
        let mut readout = PlateReadout::default();
        readout.controls.insert(0, vec![1.0, 1.0]);
        readout.controls.insert(1, vec![2.0, 2.0]);
        readout.records = vec![
            record("A1", 1.0),
            record("B1", 3.0),
            record("A7", 4.0),
            record("B7", 8.0),
            record("C7", 10.0),
        ];

        normalize_plate(&mut readout).unwrap();

        let normalized: Vec<_> = readout
            .records
            .iter()
            .map(|r| r.normalized_value.unwrap())
            .collect();
        assert_eq!(normalized, vec![1.0, 3.0, 2.0, 4.0, 5.0]);
        assert!((readout.records[4].z_score_plate.unwrap() - 1.265).abs() < EPS);
        assert!(readout.records.iter().all(|r| r.z_score_global.is_none()));
    }

    #[test]
    fn scoring_requires_normalized_records() {
        let mut records = vec![record("A1", 1.0), record("B1", 2.0)];
        assert!(matches!(
            assign_plate_z_scores(&mut records),
            Err(EngineError::Internal(_))
        ));
    }
}

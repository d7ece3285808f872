use super::error::EngineError;
use crate::core::interaction::InteractionRecord;
use crate::core::plate::PlateGrid;
use crate::core::protein::{ProteinCatalog, ProteinId, ProteinRef};
use crate::core::screen::{ControlMarker, InteractionSlot};
use std::collections::BTreeMap;
use tracing::debug;

/// Interaction records of one plate together with its negative-control reads, keyed by
/// control group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateReadout {
    pub records: Vec<InteractionRecord>,
    pub controls: BTreeMap<usize, Vec<f64>>,
}

fn lookup<'a>(
    catalog: &'a ProteinCatalog,
    id: &ProteinId,
    issues: &mut Vec<String>,
) -> Option<&'a ProteinRef> {
    let protein = catalog.get(id);
    if protein.is_none() {
        issues.push(format!("unknown protein '{}'", id));
    }
    protein
}

/// Maps one timepoint of raw reads through a screen template.
///
/// Negative-control reads are collected per control group and every bait x prey well becomes
/// an [`InteractionRecord`] carrying the catalog metadata of both proteins. Positive controls
/// and empty wells are ignored.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] listing every offending well when an interaction well
/// has no read or a non-positive or non-finite one, when a negative control read is not finite,
/// when a protein is missing from the catalog, or when a control group holding interactions has
/// no negative-control read.
pub fn interpret(
    plate_id: u32,
    slots: &PlateGrid<InteractionSlot>,
    reads: &PlateGrid<Option<f64>>,
    catalog: &ProteinCatalog,
) -> Result<PlateReadout, EngineError> {
    let mut readout = PlateReadout::default();
    let mut issues = Vec::new();

    for (address, slot) in slots.iter() {
        let read = *reads.get(address);
        match slot {
            InteractionSlot::Empty => {}
            InteractionSlot::Control {
                marker: ControlMarker::PositiveControl,
                ..
            } => {}
            InteractionSlot::Control {
                marker: ControlMarker::NegativeControl,
                ..
            } => match read {
                Some(value) if value.is_finite() => readout
                    .controls
                    .entry(address.control_group())
                    .or_default()
                    .push(value),
                Some(value) => {
                    issues.push(format!("{}: non-finite negative-control read {}", address, value));
                }
                None => debug!("Negative control {} has no read", address),
            },
            InteractionSlot::Pair { bait, prey } => {
                let bait = lookup(catalog, bait, &mut issues);
                let prey = lookup(catalog, prey, &mut issues);
                let value = match read {
                    Some(value) if !value.is_finite() => {
                        issues.push(format!("{}: non-finite read {}", address, value));
                        continue;
                    }
                    Some(value) if value > 0.0 => value,
                    Some(value) => {
                        issues.push(format!("{}: non-positive read {}", address, value));
                        continue;
                    }
                    None => {
                        issues.push(format!("{}: no read", address));
                        continue;
                    }
                };
                if let (Some(bait), Some(prey)) = (bait, prey) {
                    readout.records.push(InteractionRecord::new(
                        plate_id,
                        address,
                        bait.clone(),
                        prey.clone(),
                        value,
                    ));
                }
            }
        }
    }

    let mut groups: Vec<usize> = readout.records.iter().map(|r| r.control_group).collect();
    groups.sort_unstable();
    groups.dedup();
    for group in groups {
        if readout.controls.get(&group).is_none_or(|reads| reads.is_empty()) {
            issues.push(format!("control group {} has no negative-control read", group));
        }
    }

    if !issues.is_empty() {
        return Err(EngineError::Validation(issues.join("; ")));
    }
    debug!(
        "Interpreted {} interactions and {} control groups",
        readout.records.len(),
        readout.controls.len()
    );
    Ok(readout)
}

/// Checks that the baits of a template come from `bait_batch` and its preys from `prey_batch`.
pub fn check_batch_membership(
    slots: &PlateGrid<InteractionSlot>,
    catalog: &ProteinCatalog,
    bait_batch: u32,
    prey_batch: u32,
) -> Result<(), EngineError> {
    let mut issues = Vec::new();
    for (address, slot) in slots.iter() {
        if let Some(bait) = slot.bait() {
            if !catalog.batch_contains(bait_batch, bait) {
                issues.push(format!("{}: bait {} is not in batch {}", address, bait, bait_batch));
            }
        }
        if let Some(prey) = slot.prey() {
            if !catalog.batch_contains(prey_batch, prey) {
                issues.push(format!("{}: prey {} is not in batch {}", address, prey, prey_batch));
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation(issues.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plate::WellAddress;
    use crate::core::protein::CatalogEntry;

    fn well(s: &str) -> WellAddress {
        s.parse().unwrap()
    }

    fn catalog() -> ProteinCatalog {
        let entry = |batch, order, id: &str| CatalogEntry {
            batch,
            order,
            protein: ProteinRef {
                family: "F".to_string(),
                ..ProteinRef::with_id(id)
            },
            cloned: true,
        };
        ProteinCatalog::from_entries([
            entry(1, 1, "AT1G00001"),
            entry(2, 1, "AT2G00001"),
            entry(2, 2, "AT2G00002"),
        ])
    }

    fn pair(bait: &str, prey: &str) -> InteractionSlot {
        InteractionSlot::Pair {
            bait: ProteinId::new(bait),
            prey: ProteinId::new(prey),
        }
    }

    fn negative(bait: &str) -> InteractionSlot {
        InteractionSlot::Control {
            marker: ControlMarker::NegativeControl,
            bait: Some(ProteinId::new(bait)),
        }
    }

    fn layout() -> PlateGrid<InteractionSlot> {
        let mut slots = PlateGrid::new();
        slots.set(well("A1"), pair("AT1G00001", "AT2G00001"));
        slots.set(well("B1"), pair("AT1G00001", "AT2G00002"));
        for cell in ["C6", "D6", "E6", "F6", "G6", "H6"] {
            slots.set(well(cell), negative("AT1G00001"));
        }
        slots.set(
            well("H12"),
            InteractionSlot::Control {
                marker: ControlMarker::PositiveControl,
                bait: None,
            },
        );
        slots
    }

    fn reads() -> PlateGrid<Option<f64>> {
        PlateGrid::filled(Some(10.0)).map(|address, value| {
            if address == well("A1") { Some(20.0) } else { *value }
        })
    }

    #[test]
    fn pairs_become_records_and_controls_are_grouped() {
        let readout = interpret(7, &layout(), &reads(), &catalog()).unwrap();

        assert_eq!(readout.records.len(), 2);
        let first = &readout.records[0];
        assert_eq!(first.plate_id, 7);
        assert_eq!(first.plate_cell, well("A1"));
        assert_eq!(first.raw_value, 20.0);
        assert_eq!(first.control_group, 0);
        assert_eq!(first.bait.family, "F");

        assert_eq!(readout.controls.len(), 1);
        assert_eq!(readout.controls[&0], vec![10.0; 6]);
    }

    #[test]
    fn non_positive_and_missing_reads_are_listed() {
        let mut reads = reads();
        reads.set(well("A1"), Some(0.0));
        reads.set(well("B1"), None);
        match interpret(1, &layout(), &reads, &catalog()) {
            Err(EngineError::Validation(message)) => {
                assert!(message.contains("A1: non-positive read 0"), "{}", message);
                assert!(message.contains("B1: no read"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_finite_reads_are_rejected_in_every_well_kind() {
        let mut faulty = reads();
        faulty.set(well("A1"), Some(f64::INFINITY));
        faulty.set(well("B1"), Some(f64::NAN));
        faulty.set(well("G6"), Some(f64::NAN));
        match interpret(1, &layout(), &faulty, &catalog()) {
            Err(EngineError::Validation(message)) => {
                assert!(message.contains("A1: non-finite read inf"), "{}", message);
                assert!(message.contains("B1: non-finite read NaN"), "{}", message);
                assert!(
                    message.contains("G6: non-finite negative-control read NaN"),
                    "{}",
                    message
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn group_without_negative_control_is_rejected() {
        let mut slots = layout();
        slots.set(well("A7"), pair("AT1G00001", "AT2G00001"));
        match interpret(1, &slots, &reads(), &catalog()) {
            Err(EngineError::Validation(message)) => {
                assert!(message.contains("control group 1"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_proteins_are_rejected() {
        let mut slots = layout();
        slots.set(well("C1"), pair("AT1G00001", "AT5G99999"));
        assert!(matches!(
            interpret(1, &slots, &reads(), &catalog()),
            Err(EngineError::Validation(message)) if message.contains("AT5G99999")
        ));
    }

    #[test]
    fn batch_membership_is_checked_per_role() {
        assert!(check_batch_membership(&layout(), &catalog(), 1, 2).is_ok());
        match check_batch_membership(&layout(), &catalog(), 2, 2) {
            Err(EngineError::Validation(message)) => {
                assert!(message.contains("bait AT1G00001 is not in batch 2"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

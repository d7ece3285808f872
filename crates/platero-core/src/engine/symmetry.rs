use super::error::EngineError;
use crate::core::interaction::InteractionRecord;
use crate::core::plate::WellAddress;
use crate::core::protein::ProteinId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Left,
    Right,
}

impl Half {
    fn of(record: &InteractionRecord) -> Self {
        if record.control_group % 2 == 0 {
            Half::Left
        } else {
            Half::Right
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Half::Left => "left",
            Half::Right => "right",
        }
    }
}

fn check_half(half: Half, records: &[&InteractionRecord], issues: &mut Vec<String>) {
    let baits: BTreeSet<&str> = records.iter().map(|r| r.bait.id.as_str()).collect();
    if baits.len() > 1 {
        issues.push(format!(
            "{} half is driven by {} baits ({})",
            half.name(),
            baits.len(),
            baits.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let mut preys: BTreeMap<&str, Vec<WellAddress>> = BTreeMap::new();
    for record in records {
        preys
            .entry(record.prey.id.as_str())
            .or_default()
            .push(record.plate_cell);
    }
    for (prey, cells) in preys.iter().filter(|(_, cells)| cells.len() > 1) {
        let cells: Vec<_> = cells.iter().map(WellAddress::to_string).collect();
        issues.push(format!(
            "prey {} appears more than once in the {} half ({})",
            prey,
            half.name(),
            cells.join(", ")
        ));
    }
}

/// Checks the mirrored-half invariants of one plate's interaction records.
///
/// Each half must be driven by a single bait and list every prey at most once. When the right
/// half holds interactions, every well must hold the same prey as its mirror in the other half.
/// All problems are reported together.
pub fn validate(records: &[InteractionRecord]) -> Result<(), EngineError> {
    let (left, right): (Vec<&InteractionRecord>, Vec<&InteractionRecord>) =
        records.iter().partition(|r| Half::of(r) == Half::Left);

    let mut issues = Vec::new();
    check_half(Half::Left, &left, &mut issues);
    check_half(Half::Right, &right, &mut issues);

    if !right.is_empty() {
        let preys: BTreeMap<WellAddress, &ProteinId> =
            records.iter().map(|r| (r.plate_cell, &r.prey.id)).collect();
        for record in &left {
            let mirror = record.plate_cell.mirror();
            match preys.get(&mirror) {
                Some(prey) if **prey == record.prey.id => {}
                Some(prey) => issues.push(format!(
                    "{} holds {} but its mirror {} holds {}",
                    record.plate_cell, record.prey.id, mirror, prey
                )),
                None => issues.push(format!(
                    "{} holds {} but its mirror {} is empty",
                    record.plate_cell, record.prey.id, mirror
                )),
            }
        }
        for record in &right {
            let mirror = record.plate_cell.mirror();
            if !preys.contains_key(&mirror) {
                issues.push(format!(
                    "{} holds {} but its mirror {} is empty",
                    record.plate_cell, record.prey.id, mirror
                ));
            }
        }
    }

    if issues.is_empty() {
        debug!(
            "Plate halves are symmetric ({} left, {} right records)",
            left.len(),
            right.len()
        );
        Ok(())
    } else {
        Err(EngineError::Asymmetry(issues.join("; ")))
    }
}

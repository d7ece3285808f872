use super::plate::{HALF_COLUMNS, PlateGrid, ROWS, WELL_COUNT, WellAddress};
use super::protein::{ProteinId, ProteinRef};
use super::storage::{CapacityError, PREY_STORAGE_CAPACITY, PreyStoragePlate};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Separator between bait and prey in a template cell and in interaction keys.
pub const DELIMITER: &str = " x ";

const NEGATIVE_CONTROL_TOKEN: &str = "[NC]";
const POSITIVE_CONTROL_TOKEN: &str = "[PC]";

static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+[xX]\s+(\S+)$").expect("pair pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMarker {
    PositiveControl,
    NegativeControl,
}

impl ControlMarker {
    pub fn token(&self) -> &'static str {
        match self {
            ControlMarker::PositiveControl => POSITIVE_CONTROL_TOKEN,
            ControlMarker::NegativeControl => NEGATIVE_CONTROL_TOKEN,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            POSITIVE_CONTROL_TOKEN => Some(ControlMarker::PositiveControl),
            NEGATIVE_CONTROL_TOKEN => Some(ControlMarker::NegativeControl),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("Couldn't extract bait and prey from template cell '{0}'")]
    Malformed(String),
    #[error("Template cell '{0}' mixes a control marker with a bait protein on the wrong side")]
    MisplacedControl(String),
}

/// Content of one screen plate well.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionSlot {
    #[default]
    Empty,
    /// A control well. Negative controls are run against the bait of their half.
    Control {
        marker: ControlMarker,
        bait: Option<ProteinId>,
    },
    /// A bait protein tested against a prey protein.
    Pair { bait: ProteinId, prey: ProteinId },
}

impl InteractionSlot {
    pub fn pair(bait: &ProteinRef, prey: &ProteinRef) -> Self {
        InteractionSlot::Pair {
            bait: bait.id.clone(),
            prey: prey.id.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InteractionSlot::Empty)
    }

    pub fn bait(&self) -> Option<&ProteinId> {
        match self {
            InteractionSlot::Empty => None,
            InteractionSlot::Control { bait, .. } => bait.as_ref(),
            InteractionSlot::Pair { bait, .. } => Some(bait),
        }
    }

    pub fn prey(&self) -> Option<&ProteinId> {
        match self {
            InteractionSlot::Pair { prey, .. } => Some(prey),
            _ => None,
        }
    }

    pub fn control(&self) -> Option<ControlMarker> {
        match self {
            InteractionSlot::Control { marker, .. } => Some(*marker),
            _ => None,
        }
    }
}

impl fmt::Display for InteractionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionSlot::Empty => Ok(()),
            InteractionSlot::Control { marker, bait: None } => f.write_str(marker.token()),
            InteractionSlot::Control {
                marker,
                bait: Some(bait),
            } => write!(f, "{}{}{}", bait, DELIMITER, marker.token()),
            InteractionSlot::Pair { bait, prey } => write!(f, "{}{}{}", bait, DELIMITER, prey),
        }
    }
}

impl FromStr for InteractionSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Ok(InteractionSlot::Empty);
        }
        if let Some(marker) = ControlMarker::from_token(&text) {
            return Ok(InteractionSlot::Control { marker, bait: None });
        }

        let captures = PAIR_RE
            .captures(&text)
            .ok_or_else(|| SlotParseError::Malformed(s.to_string()))?;
        let bait = &captures[1];
        let prey = &captures[2];

        match (ControlMarker::from_token(bait), ControlMarker::from_token(prey)) {
            (None, None) => Ok(InteractionSlot::Pair {
                bait: ProteinId::new(bait),
                prey: ProteinId::new(prey),
            }),
            (None, Some(marker)) => Ok(InteractionSlot::Control {
                marker,
                bait: Some(ProteinId::new(bait)),
            }),
            (Some(bait_marker), Some(prey_marker)) if bait_marker == prey_marker => {
                Ok(InteractionSlot::Control {
                    marker: prey_marker,
                    bait: None,
                })
            }
            _ => Err(SlotParseError::MisplacedControl(s.to_string())),
        }
    }
}

/// A screen plate combining up to two baits with the full layout of a prey storage plate.
///
/// The first bait drives the left half (columns 1-6) and the second bait the right half
/// (columns 7-12), so mirrored wells hold the same prey. Controls sit at fixed wells:
/// `G6` (negative, bait 1), `G12` (negative, bait 2) and `H12` (positive).
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPlate {
    name: String,
    baits: Vec<ProteinRef>,
    bait_plate_name: String,
    bait_plate_offset: usize,
    prey_plate_name: String,
    wells: PlateGrid<InteractionSlot>,
}

impl ScreenPlate {
    pub fn new(
        baits: &[ProteinRef],
        bait_plate_name: &str,
        bait_plate_offset: usize,
        prey_plate: &PreyStoragePlate,
    ) -> Result<Self, CapacityError> {
        if baits.is_empty() {
            return Err(CapacityError::Empty { kind: "bait" });
        }
        if baits.len() > Self::capacity() {
            return Err(CapacityError::Exceeded {
                kind: "bait",
                capacity: Self::capacity(),
                given: baits.len(),
            });
        }

        let mut wells: PlateGrid<InteractionSlot> = PlateGrid::new();
        for column_index in 0..HALF_COLUMNS as usize {
            for row_index in 0..ROWS.len() {
                let Some(cell_a) = WellAddress::from_indices(row_index, column_index) else {
                    continue;
                };
                let cell_b = cell_a.mirror();

                if let Some(prey) = prey_plate.get(cell_a) {
                    wells.set(cell_a, InteractionSlot::pair(&baits[0], prey));
                }
                if let (Some(bait), Some(prey)) = (baits.get(1), prey_plate.get(cell_b)) {
                    wells.set(cell_b, InteractionSlot::pair(bait, prey));
                }
            }
        }

        for (address, slot) in Self::control_wells(baits) {
            wells.set(address, slot);
        }

        Ok(Self {
            name: String::new(),
            baits: baits.to_vec(),
            bait_plate_name: bait_plate_name.to_string(),
            bait_plate_offset,
            prey_plate_name: prey_plate.name().to_string(),
            wells,
        })
    }

    /// Number of distinct baits a single screen plate can host.
    pub fn capacity() -> usize {
        WELL_COUNT / PREY_STORAGE_CAPACITY
    }

    fn control_wells(baits: &[ProteinRef]) -> Vec<(WellAddress, InteractionSlot)> {
        let mut controls = Vec::with_capacity(3);
        let negative = |bait: &ProteinRef| InteractionSlot::Control {
            marker: ControlMarker::NegativeControl,
            bait: Some(bait.id.clone()),
        };
        if let Ok(g6) = WellAddress::new('G', HALF_COLUMNS) {
            controls.push((g6, negative(&baits[0])));
        }
        if let (Some(bait), Ok(g12)) = (baits.get(1), WellAddress::new('G', 2 * HALF_COLUMNS)) {
            controls.push((g12, negative(bait)));
        }
        if let Ok(h12) = WellAddress::new('H', 2 * HALF_COLUMNS) {
            controls.push((
                h12,
                InteractionSlot::Control {
                    marker: ControlMarker::PositiveControl,
                    bait: None,
                },
            ));
        }
        controls
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn baits(&self) -> &[ProteinRef] {
        &self.baits
    }

    pub fn bait_plate_name(&self) -> &str {
        &self.bait_plate_name
    }

    /// Column of the first bait within its bait storage plate.
    pub fn bait_plate_offset(&self) -> usize {
        self.bait_plate_offset
    }

    pub fn prey_plate_name(&self) -> &str {
        &self.prey_plate_name
    }

    pub fn wells(&self) -> &PlateGrid<InteractionSlot> {
        &self.wells
    }

    pub fn get(&self, address: WellAddress) -> &InteractionSlot {
        self.wells.get(address)
    }
}

use super::traits::PlateFile;
use crate::core::plate::{COLUMNS, PlateGrid, ROWS, WELL_COUNT};
use crate::core::protein::ProteinId;
use crate::core::screen::{InteractionSlot, ScreenPlate};
use crate::core::storage::StoragePlate;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Well-known metadata fields of a template.
pub mod fields {
    pub const PLATE_NAME: &str = "Plate name";
    pub const PLATE_TYPE: &str = "Plate type";
    pub const BATCH_NAME: &str = "Batch name";
    pub const TIMESHIFT: &str = "Timeshift";
    pub const BAIT_PLATE: &str = "Bait plate";
    pub const PREY_PLATE: &str = "Prey plate";
}

pub const SCREEN_PLATE_TYPE: &str = "Screen";

const METADATA_HEADER: [&str; 2] = ["Field", "Value"];
const GRID_MARKER: &str = "#";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Template has no plate grid (a row starting with '#' followed by 8 plate rows)")]
    MissingGrid,
    #[error("Malformed template row on line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
    #[error("Invalid template cells: {}", .0.join("; "))]
    InvalidCells(Vec<String>),
}

/// Ordered key/value block describing a plate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateMetadata {
    fields: Vec<(String, String)>,
}

impl TemplateMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, keeping its original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Timepoint of the plate-reader export to interpret, if filled in.
    pub fn timeshift(&self) -> Option<&str> {
        self.get(fields::TIMESHIFT)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// What each well of a plate contains, independent of any measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub metadata: TemplateMetadata,
    pub cells: PlateGrid<String>,
}

impl Template {
    pub fn from_screen_plate(plate: &ScreenPlate, metadata: TemplateMetadata) -> Self {
        Self {
            metadata,
            cells: plate.wells().map(|_, slot| slot.to_string()),
        }
    }

    pub fn from_storage_plate(plate: &StoragePlate, metadata: TemplateMetadata) -> Self {
        Self {
            metadata,
            cells: plate.wells().map(|_, protein| {
                protein
                    .as_ref()
                    .map(|p| p.id.to_string())
                    .unwrap_or_default()
            }),
        }
    }

    /// Interprets the cells as screen plate slots, reporting every unreadable cell.
    pub fn screen_slots(&self) -> Result<PlateGrid<InteractionSlot>, TemplateError> {
        let mut invalid = Vec::new();
        let slots = self.cells.map(|address, text| {
            text.parse::<InteractionSlot>().unwrap_or_else(|e| {
                invalid.push(format!("{}: {}", address, e));
                InteractionSlot::Empty
            })
        });
        if invalid.is_empty() {
            Ok(slots)
        } else {
            Err(TemplateError::InvalidCells(invalid))
        }
    }

    /// Interprets the cells as storage plate protein ids.
    pub fn storage_proteins(&self) -> PlateGrid<Option<ProteinId>> {
        self.cells
            .map(|_, text| Some(ProteinId::new(text)).filter(|id| !id.is_empty()))
    }
}

/// CSV rendition of a template: a `Field,Value` metadata block followed by the plate grid
/// (`#,1,...,12` then one line per row `A..H`).
pub struct TemplateFile;

impl PlateFile for TemplateFile {
    type Content = Template;
    type Error = TemplateError;

    fn read_from(reader: impl Read) -> Result<Template, TemplateError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut metadata = TemplateMetadata::new();
        let mut cells: Vec<String> = Vec::with_capacity(WELL_COUNT);
        let mut in_grid = false;
        let mut next_row = 0;

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let first = record.get(0).unwrap_or_default();

            if !in_grid {
                if first == GRID_MARKER {
                    in_grid = true;
                } else if !first.is_empty()
                    && !(first == METADATA_HEADER[0] && record.get(1) == Some(METADATA_HEADER[1]))
                {
                    metadata.insert(first, record.get(1).unwrap_or_default());
                }
                continue;
            }

            if next_row == ROWS.len() {
                if record.iter().all(str::is_empty) {
                    continue;
                }
                return Err(TemplateError::MalformedRow {
                    line,
                    reason: "unexpected content after row H".to_string(),
                });
            }

            let expected = ROWS[next_row];
            if !first.eq_ignore_ascii_case(&expected.to_string()) {
                return Err(TemplateError::MalformedRow {
                    line,
                    reason: format!("expected row '{}', found '{}'", expected, first),
                });
            }
            if record.len() > COLUMNS as usize + 1 {
                return Err(TemplateError::MalformedRow {
                    line,
                    reason: format!("{} columns found, at most {} expected", record.len() - 1, COLUMNS),
                });
            }

            for column in 1..=COLUMNS as usize {
                cells.push(record.get(column).unwrap_or_default().to_string());
            }
            next_row += 1;
        }

        if !in_grid {
            return Err(TemplateError::MissingGrid);
        }
        let cells = PlateGrid::from_row_major(cells).ok_or_else(|| TemplateError::MalformedRow {
            line: 0,
            reason: format!("only {} of {} plate rows present", next_row, ROWS.len()),
        })?;

        Ok(Template { metadata, cells })
    }

    fn write_to(template: &Template, writer: impl Write) -> Result<(), TemplateError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);

        csv_writer.write_record(METADATA_HEADER)?;
        for (key, value) in template.metadata.iter() {
            csv_writer.write_record([key, value])?;
        }

        let mut header = vec![GRID_MARKER.to_string()];
        header.extend((1..=COLUMNS).map(|c| c.to_string()));
        csv_writer.write_record(&header)?;

        for (row_index, row) in ROWS.iter().enumerate() {
            let mut record = vec![row.to_string()];
            record.extend(template.cells.row(row_index).iter().cloned());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plate::WellAddress;
    use crate::core::protein::ProteinRef;
    use crate::core::storage::PreyStoragePlate;

    fn proteins(prefix: &str, n: usize) -> Vec<ProteinRef> {
        (0..n)
            .map(|i| ProteinRef::with_id(format!("{}{:05}", prefix, i)))
            .collect()
    }

    fn screen_plate() -> ScreenPlate {
        let prey = PreyStoragePlate::new(&proteins("AT2G", 46))
            .unwrap()
            .with_name("batch_02_prey");
        ScreenPlate::new(&proteins("AT1G", 2), "batch_01_bait_1", 0, &prey)
            .unwrap()
            .with_name("plate_00001")
    }

    fn to_bytes(template: &Template) -> Vec<u8> {
        let mut buffer = Vec::new();
        TemplateFile::write_to(template, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn screen_plate_survives_export_and_import() {
        let plate = screen_plate();
        let metadata = TemplateMetadata::new()
            .with(fields::PLATE_NAME, plate.name())
            .with(fields::TIMESHIFT, "00:30:00");
        let template = Template::from_screen_plate(&plate, metadata);

        let bytes = to_bytes(&template);
        let imported = TemplateFile::read_from(bytes.as_slice()).unwrap();

        assert_eq!(imported, template);
        let slots = imported.screen_slots().unwrap();
        for address in WellAddress::all() {
            assert_eq!(slots.get(address), plate.get(address), "{}", address);
        }
        assert_eq!(imported.metadata.timeshift(), Some("00:30:00"));
        assert_eq!(imported.metadata.get(fields::PLATE_NAME), Some("plate_00001"));
    }

    #[test]
    fn written_grid_follows_row_major_order() {
        let template = Template::from_screen_plate(&screen_plate(), TemplateMetadata::new());
        let text = String::from_utf8(to_bytes(&template)).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Field,Value");
        assert_eq!(lines[1], "#,1,2,3,4,5,6,7,8,9,10,11,12");
        assert!(lines[2].starts_with("A,AT1G00000 x AT2G00000,"));
        assert!(lines[9].starts_with("H,"));
        assert!(lines[9].ends_with(",[PC]"));
    }

    #[test]
    fn empty_timeshift_counts_as_missing() {
        let metadata = TemplateMetadata::new().with(fields::TIMESHIFT, "  ");
        assert_eq!(metadata.timeshift(), None);
    }

    #[test]
    fn metadata_insert_replaces_in_place() {
        let mut metadata = TemplateMetadata::new().with("a", "1").with("b", "2");
        metadata.insert("a", "3");
        let collected: Vec<_> = metadata.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let text = "Plate name,p\n#,1,2,3,4,5,6,7,8,9,10,11,12\nA,[PC]\nB\nC\nD\nE\nF\nG\nH\n";
        let template = TemplateFile::read_from(text.as_bytes()).unwrap();
        let slots = template.screen_slots().unwrap();
        assert!(slots.get("A1".parse().unwrap()).control().is_some());
        assert!(slots.get("A2".parse().unwrap()).is_empty());
    }

    #[test]
    fn missing_rows_and_grid_are_reported() {
        assert!(matches!(
            TemplateFile::read_from("Plate name,p\n".as_bytes()),
            Err(TemplateError::MissingGrid)
        ));
        assert!(matches!(
            TemplateFile::read_from("#,1\nA\nB\n".as_bytes()),
            Err(TemplateError::MalformedRow { .. })
        ));
        assert!(matches!(
            TemplateFile::read_from("#,1\nA\nC\n".as_bytes()),
            Err(TemplateError::MalformedRow { .. })
        ));
    }

    #[test]
    fn unreadable_cells_are_all_listed() {
        let mut cells = PlateGrid::<String>::new();
        cells.set("A1".parse().unwrap(), "garbage".to_string());
        cells.set("B2".parse().unwrap(), "[NC] x AT1G00001".to_string());
        let template = Template {
            metadata: TemplateMetadata::new(),
            cells,
        };
        match template.screen_slots() {
            Err(TemplateError::InvalidCells(cells)) => {
                assert_eq!(cells.len(), 2);
                assert!(cells[0].starts_with("A1"));
                assert!(cells[1].starts_with("B2"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn storage_template_lists_protein_ids() {
        let prey = PreyStoragePlate::new(&proteins("AT2G", 3)).unwrap();
        let template = Template::from_storage_plate(prey.plate(), TemplateMetadata::new());
        let ids = template.storage_proteins();
        assert_eq!(
            ids.get("A7".parse().unwrap()).as_ref().map(|id| id.as_str()),
            Some("AT2G00000")
        );
        assert_eq!(ids.get("D1".parse().unwrap()), &None);
    }
}

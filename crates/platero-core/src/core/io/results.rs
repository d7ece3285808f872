use super::traits::PlateFile;
use crate::core::plate::{PlateGrid, WellAddress};
use std::collections::HashSet;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::warn;

const TIME_HEADER: &str = "Time";

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Results file has no 'Time' header row followed by well addresses")]
    MissingHeader,
    #[error("Invalid results header on line {line}: {reason}")]
    InvalidHeader { line: u64, reason: String },
    #[error("Invalid read on line {line} for well {well}: '{value}'")]
    InvalidValue {
        line: u64,
        well: WellAddress,
        value: String,
    },
    #[error("Timepoint '{timepoint}' not found (available: {})", .available.join(", "))]
    TimepointNotFound {
        timepoint: String,
        available: Vec<String>,
    },
}

/// Reads of every measured well at one timepoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TimepointRow {
    pub timepoint: String,
    /// One value per entry of [`PlateReads::wells`]; `None` for blank cells.
    pub values: Vec<Option<f64>>,
}

/// Content of a plate-reader export: a metadata block, the measured wells and one row of
/// reads per timepoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateReads {
    pub metadata: Vec<(String, String)>,
    pub wells: Vec<WellAddress>,
    pub rows: Vec<TimepointRow>,
}

impl PlateReads {
    pub fn timepoints(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.timepoint.as_str())
    }

    /// Reads at the requested timepoint; wells not measured stay `None`.
    ///
    /// When several rows match, the first one wins.
    pub fn reads_at(&self, timepoint: &str) -> Result<PlateGrid<Option<f64>>, ResultsError> {
        let mut matching = self
            .rows
            .iter()
            .filter(|row| timepoints_match(&row.timepoint, timepoint));

        let row = matching
            .next()
            .ok_or_else(|| ResultsError::TimepointNotFound {
                timepoint: timepoint.to_string(),
                available: self.timepoints().map(str::to_string).collect(),
            })?;
        let extra = matching.count();
        if extra > 0 {
            warn!(
                "{} additional rows match timepoint '{}'; using the first one",
                extra, timepoint
            );
        }

        let mut grid = PlateGrid::new();
        for (well, value) in self.wells.iter().zip(&row.values) {
            grid.set(*well, *value);
        }
        Ok(grid)
    }
}

/// Parses `[h:]mm:ss` into seconds.
fn parse_duration(text: &str) -> Option<u64> {
    let parts = text
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [minutes, seconds] => Some(minutes * 60 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600 + minutes * 60 + seconds),
        _ => None,
    }
}

/// Compares timepoints as durations when both parse, otherwise as trimmed text.
pub fn timepoints_match(a: &str, b: &str) -> bool {
    match (parse_duration(a), parse_duration(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

pub struct ResultsFile;

impl ResultsFile {
    fn parse_header(record: &csv::StringRecord, line: u64) -> Result<Vec<WellAddress>, ResultsError> {
        let mut seen = HashSet::new();
        let mut wells = Vec::with_capacity(record.len().saturating_sub(1));
        for field in record.iter().skip(1) {
            if field.is_empty() {
                continue;
            }
            let well: WellAddress = field.parse().map_err(|e| ResultsError::InvalidHeader {
                line,
                reason: format!("{}", e),
            })?;
            if !seen.insert(well) {
                return Err(ResultsError::InvalidHeader {
                    line,
                    reason: format!("well {} listed twice", well),
                });
            }
            wells.push(well);
        }
        if wells.is_empty() {
            return Err(ResultsError::InvalidHeader {
                line,
                reason: "no well columns".to_string(),
            });
        }
        Ok(wells)
    }

    fn parse_row(
        record: &csv::StringRecord,
        wells: &[WellAddress],
        line: u64,
    ) -> Result<TimepointRow, ResultsError> {
        let values = wells
            .iter()
            .enumerate()
            .map(|(i, well)| {
                let text = record.get(i + 1).unwrap_or_default();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(Some)
                    .ok_or_else(|| ResultsError::InvalidValue {
                        line,
                        well: *well,
                        value: text.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TimepointRow {
            timepoint: record.get(0).unwrap_or_default().to_string(),
            values,
        })
    }
}

impl PlateFile for ResultsFile {
    type Content = PlateReads;
    type Error = ResultsError;

    fn read_from(reader: impl Read) -> Result<PlateReads, ResultsError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut reads = PlateReads::default();
        let mut header_seen = false;

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if record.iter().all(str::is_empty) {
                continue;
            }
            let first = record.get(0).unwrap_or_default();

            if !header_seen {
                if first.eq_ignore_ascii_case(TIME_HEADER) {
                    reads.wells = Self::parse_header(&record, line)?;
                    header_seen = true;
                } else {
                    reads
                        .metadata
                        .push((first.to_string(), record.get(1).unwrap_or_default().to_string()));
                }
                continue;
            }

            reads.rows.push(Self::parse_row(&record, &reads.wells, line)?);
        }

        if !header_seen {
            return Err(ResultsError::MissingHeader);
        }
        Ok(reads)
    }

    fn write_to(reads: &PlateReads, writer: impl Write) -> Result<(), ResultsError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);

        for (key, value) in &reads.metadata {
            csv_writer.write_record([key, value])?;
        }

        let mut header = vec![TIME_HEADER.to_string()];
        header.extend(reads.wells.iter().map(WellAddress::to_string));
        csv_writer.write_record(&header)?;

        for row in &reads.rows {
            let mut record = vec![row.timepoint.clone()];
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

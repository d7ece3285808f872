use super::traits::PlateFile;
use crate::core::protein::{CatalogEntry, ProteinCatalog, ProteinId, ProteinRef};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static PROTEIN_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AT[0-9]G[0-9]{5}(?:\.\w+)?$").expect("protein id pattern is a valid regex")
});

const CLONED_YES: &str = "yes";
const CLONED_NO: &str = "no";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid protein catalog:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),
}

/// Whether a string is a well-formed protein id (e.g. `AT1G01010` or `AT1G01010.2`).
pub fn is_valid_protein_id(id: &str) -> bool {
    PROTEIN_ID_RE.is_match(id)
}

/// One line of the catalog CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CatalogRow {
    batch: u32,
    order: u32,
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    family: String,
    #[serde(default)]
    subfamily: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    cloned: String,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(entry: &CatalogEntry) -> Self {
        let protein = &entry.protein;
        let symbol = if protein.label == protein.id.as_str() {
            String::new()
        } else {
            protein.label.clone()
        };
        Self {
            batch: entry.batch,
            order: entry.order,
            id: protein.id.to_string(),
            symbol,
            family: protein.family.clone(),
            subfamily: protein.subfamily.clone(),
            nickname: protein.nickname.clone(),
            cloned: if entry.cloned { CLONED_YES } else { CLONED_NO }.to_string(),
        }
    }
}

/// Checks a row, appending a message for every problem found.
fn check_row(row: &CatalogRow, line: usize, id: &ProteinId, issues: &mut Vec<String>) {
    let required = [
        ("id", row.id.as_str()),
        ("family", row.family.as_str()),
        ("subfamily", row.subfamily.as_str()),
        ("nickname", row.nickname.as_str()),
    ];
    let missing: Vec<_> = required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        issues.push(format!("line {}: missing {}", line, missing.join(", ")));
    }
    if !id.is_empty() && !is_valid_protein_id(id.as_str()) {
        issues.push(format!("line {}: invalid protein id '{}'", line, row.id));
    }
}

/// The protein catalog CSV (`batch,order,id,symbol,family,subfamily,nickname,cloned`).
pub struct CatalogFile;

impl CatalogFile {
    /// Reads, validates and snapshots the catalog at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<ProteinCatalog, CatalogError> {
        let entries = Self::read_from_path(path)?;
        Ok(ProteinCatalog::from_entries(entries))
    }
}

impl PlateFile for CatalogFile {
    type Content = Vec<CatalogEntry>;
    type Error = CatalogError;

    fn read_from(reader: impl Read) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        let mut issues = Vec::new();
        let mut seen: HashSet<(u32, ProteinId)> = HashSet::new();

        for (index, result) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = result?;
            let line = index + 2;
            let id = ProteinId::new(&row.id);

            check_row(&row, line, &id, &mut issues);
            if !id.is_empty() && !seen.insert((row.batch, id.clone())) {
                issues.push(format!(
                    "line {}: id '{}' listed twice in batch {}",
                    line, id, row.batch
                ));
            }

            let label = if row.symbol.is_empty() {
                id.to_string()
            } else {
                row.symbol.clone()
            };
            entries.push(CatalogEntry {
                batch: row.batch,
                order: row.order,
                protein: ProteinRef {
                    id,
                    label,
                    family: row.family,
                    subfamily: row.subfamily,
                    nickname: row.nickname,
                },
                cloned: row.cloned.eq_ignore_ascii_case(CLONED_YES),
            });
        }

        if issues.is_empty() {
            Ok(entries)
        } else {
            Err(CatalogError::Invalid(issues))
        }
    }

    fn write_to(entries: &Vec<CatalogEntry>, writer: impl Write) -> Result<(), CatalogError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for entry in entries {
            csv_writer.serialize(CatalogRow::from(entry))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const TEMPLATE_SUFFIX: &str = "_template.csv";
pub const RESULTS_SUFFIX: &str = "_results.csv";

static PLATE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^plate_([0-9]+)_b([0-9]+)_p([0-9]+)_(template|results)\.csv$")
        .expect("plate file pattern is a valid regex")
});

pub fn batch_name(batch_id: u32) -> String {
    format!("batch_{:02}", batch_id)
}

pub fn storage_prey_plate_name(batch_id: u32) -> String {
    format!("{}_prey", batch_name(batch_id))
}

pub fn storage_bait_plate_name(batch_id: u32, index: usize) -> String {
    format!("{}_bait_{}", batch_name(batch_id), index)
}

pub fn screen_plate_name(plate_id: u32) -> String {
    format!("plate_{:05}", plate_id)
}

pub fn screen_template_file_name(plate_id: u32, bait_batch: u32, prey_batch: u32) -> String {
    format!(
        "{}_b{:02}_p{:02}{}",
        screen_plate_name(plate_id),
        bait_batch,
        prey_batch,
        TEMPLATE_SUFFIX
    )
}

pub fn storage_template_file_name(plate_name: &str) -> String {
    format!("{}.csv", plate_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateFileKind {
    Template,
    Results,
}

/// Identifiers encoded in a screen template or results file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateFileName {
    pub plate_id: u32,
    pub bait_batch: u32,
    pub prey_batch: u32,
    pub kind: PlateFileKind,
}

impl PlateFileName {
    /// Parses a bare file name such as `plate_00003_b01_p02_results.csv`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = PLATE_FILE_RE.captures(file_name)?;
        let kind = match &captures[4] {
            "template" => PlateFileKind::Template,
            _ => PlateFileKind::Results,
        };
        Some(Self {
            plate_id: captures[1].parse().ok()?,
            bait_batch: captures[2].parse().ok()?,
            prey_batch: captures[3].parse().ok()?,
            kind,
        })
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse)
    }
}

/// Path of the template that goes with a results file.
pub fn template_path_for_results(results_path: &Path) -> Option<PathBuf> {
    let file_name = results_path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(RESULTS_SUFFIX)?;
    Some(results_path.with_file_name(format!("{}{}", stem, TEMPLATE_SUFFIX)))
}

use crate::core::io::export::{write_crosstab, write_interactions};
use crate::core::io::results::ResultsFile;
use crate::core::io::template::TemplateFile;
use crate::core::io::traits::PlateFile;
use crate::core::interaction::InteractionRecord;
use crate::core::naming::{PlateFileKind, PlateFileName, RESULTS_SUFFIX, template_path_for_results};
use crate::core::protein::ProteinCatalog;
use crate::engine::aggregate::{Dataset, ZScoreBasis, crosstab};
use crate::engine::config::{MissingTemplatePolicy, ProcessingConfig};
use crate::engine::error::EngineError;
use crate::engine::interpret::{PlateReadout, check_batch_membership, interpret};
use crate::engine::normalize::normalize_plate;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::symmetry;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const INTERACTIONS_FILE_STEM: &str = "interactions";

/// A results file and the template it is interpreted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatePair {
    pub plate: PlateFileName,
    pub results: PathBuf,
    pub template: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub pairs: Vec<PlatePair>,
    /// Results files without a usable template next to them.
    pub unmatched: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub dataset: Dataset,
    pub skipped: Vec<PathBuf>,
    pub exported: Vec<PathBuf>,
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    let entries = fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Finds every results file below `input_dir` and pairs it with its template.
///
/// Pairs come out sorted by path, which fixes the processing order.
pub fn discover(input_dir: &Path) -> Result<Discovery, EngineError> {
    let mut files = Vec::new();
    collect_files(input_dir, &mut files)?;
    files.sort();

    let mut discovery = Discovery::default();
    for path in files {
        let is_results = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(RESULTS_SUFFIX));
        if !is_results {
            continue;
        }

        let plate = PlateFileName::from_path(&path).filter(|p| p.kind == PlateFileKind::Results);
        let template = template_path_for_results(&path).filter(|t| t.is_file());
        match (plate, template) {
            (Some(plate), Some(template)) => discovery.pairs.push(PlatePair {
                plate,
                results: path,
                template,
            }),
            (None, _) => {
                warn!("Results file {} does not follow the plate naming convention", path.display());
                discovery.unmatched.push(path);
            }
            (Some(_), None) => {
                warn!("No template found for results file {}", path.display());
                discovery.unmatched.push(path);
            }
        }
    }
    debug!(
        "Discovered {} plate(s) and {} unmatched results file(s)",
        discovery.pairs.len(),
        discovery.unmatched.len()
    );
    Ok(discovery)
}

/// Reads, interprets, validates and normalizes one plate.
pub fn process_plate(
    pair: &PlatePair,
    catalog: &ProteinCatalog,
    config: &ProcessingConfig,
) -> Result<PlateReadout, EngineError> {
    let template = TemplateFile::read_from_path(&pair.template)
        .map_err(|e| EngineError::template(&pair.template, e))?;
    let slots = template
        .screen_slots()
        .map_err(|e| EngineError::template(&pair.template, e))?;

    if config.validate_batches {
        check_batch_membership(&slots, catalog, pair.plate.bait_batch, pair.plate.prey_batch)?;
    }

    let timeshift = template.metadata.timeshift().ok_or_else(|| {
        EngineError::Validation(format!(
            "{}: the Timeshift field is empty",
            pair.template.display()
        ))
    })?;
    let reads = ResultsFile::read_from_path(&pair.results)
        .and_then(|reads| reads.reads_at(timeshift))
        .map_err(|e| EngineError::results(&pair.results, e))?;

    let mut readout = interpret(pair.plate.plate_id, &slots, &reads, catalog)?;
    symmetry::validate(&readout.records)?;
    normalize_plate(&mut readout)?;
    Ok(readout)
}

fn plate_label(pair: &PlatePair) -> String {
    pair.results
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| pair.results.display().to_string())
}

fn process_logged(
    index: usize,
    total: usize,
    pair: &PlatePair,
    catalog: &ProteinCatalog,
    config: &ProcessingConfig,
    reporter: &ProgressReporter,
) -> Result<(u32, Vec<InteractionRecord>), EngineError> {
    let label = plate_label(pair);
    info!("Processing results plate ({}/{}): {}", index + 1, total, label);
    let readout = process_plate(pair, catalog, config)
        .map_err(|e| EngineError::plate_failed(label, e))?;
    reporter.report(Progress::TaskIncrement);
    Ok((pair.plate.plate_id, readout.records))
}

/// Surfaces what the merged dataset leaves ambiguous or empty in the exported tables.
fn report_dataset_notes(dataset: &Dataset, reporter: &ProgressReporter) {
    if !dataset.duplicates.is_empty() {
        reporter.report(Progress::Message(format!(
            "{} interaction(s) were measured on more than one plate",
            dataset.duplicates.len()
        )));
    }
    let missing = dataset.crosstab().missing;
    if missing > 0 {
        reporter.report(Progress::Message(format!(
            "{} bait/prey combination(s) were never measured and read as 0 in the crosstabs",
            missing
        )));
    }
}

/// Renders the interaction table and its crosstab under `stem`.
fn render_table(
    records: &[InteractionRecord],
    stem: &str,
    files: &mut Vec<(String, Vec<u8>)>,
) -> Result<(), EngineError> {
    let table = format!("{}.csv", stem);
    let mut buffer = Vec::new();
    write_interactions(records, &mut buffer).map_err(|e| EngineError::export(&table, e))?;
    files.push((table, buffer));

    let pivot = format!("{}_crosstab.csv", stem);
    let mut buffer = Vec::new();
    write_crosstab(&crosstab(records), &mut buffer).map_err(|e| EngineError::export(&pivot, e))?;
    files.push((pivot, buffer));
    Ok(())
}

fn partial_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!(".{}.partial", name))
}

fn discard_partials(output_dir: &Path, names: &[&str]) {
    for name in names {
        let path = partial_path(output_dir, name);
        if let Err(e) = fs::remove_file(&path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Writes every file to a hidden temporary first and moves them into place only once all of
/// them are on disk.
fn write_all_or_nothing(
    output_dir: &Path,
    files: &[(String, Vec<u8>)],
) -> Result<Vec<PathBuf>, EngineError> {
    let mut staged: Vec<&str> = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let partial = partial_path(output_dir, name);
        if let Err(e) = fs::write(&partial, contents) {
            discard_partials(output_dir, &staged);
            return Err(EngineError::io(&partial, e));
        }
        staged.push(name.as_str());
    }

    let mut written = Vec::with_capacity(files.len());
    for (index, (name, _)) in files.iter().enumerate() {
        let target = output_dir.join(name);
        if let Err(e) = fs::rename(partial_path(output_dir, name), &target) {
            discard_partials(output_dir, &staged[index..]);
            return Err(EngineError::io(&target, e));
        }
        let kind = if name.ends_with("_crosstab.csv") {
            "crosstab"
        } else {
            "interaction table"
        };
        info!("Saved {} to {}", kind, target.display());
        written.push(target);
    }
    Ok(written)
}

/// Writes the full table and, for every multiplier, the globally and per-plate thresholded
/// variants, each with its crosstab.
///
/// Every table is rendered before anything touches `output_dir`, so a failed write leaves none of
/// this run's files behind.
pub fn export(
    dataset: &Dataset,
    output_dir: &Path,
    thresholds: &[u32],
) -> Result<Vec<PathBuf>, EngineError> {
    let mut files = Vec::with_capacity(2 + 4 * thresholds.len());
    render_table(&dataset.records, INTERACTIONS_FILE_STEM, &mut files)?;
    for &multiplier in thresholds {
        let variants = [
            (ZScoreBasis::Global, format!("{}_Z{}", INTERACTIONS_FILE_STEM, multiplier)),
            (ZScoreBasis::PerPlate, format!("{}_Z{}_plate", INTERACTIONS_FILE_STEM, multiplier)),
        ];
        for (basis, stem) in variants {
            let records = dataset.thresholded(multiplier as f64, basis);
            render_table(&records, &stem, &mut files)?;
        }
    }

    fs::create_dir_all(output_dir).map_err(|e| EngineError::io(output_dir, e))?;
    write_all_or_nothing(output_dir, &files)
}

/// Processes every results file of `config.input_dir` and exports the merged interactions to
/// `config.output_dir`.
///
/// A failing plate fails the run and nothing is exported.
#[instrument(skip_all, name = "processing_workflow")]
pub fn run(
    catalog: &ProteinCatalog,
    config: &ProcessingConfig,
    reporter: &ProgressReporter,
) -> Result<ProcessingResult, EngineError> {
    // === Phase 1: Discovery ===
    reporter.report(Progress::PhaseStart { name: "Discovery" });
    let discovery = discover(&config.input_dir)?;
    if !discovery.unmatched.is_empty() {
        match config.missing_template {
            MissingTemplatePolicy::Abort => {
                let files: Vec<_> = discovery
                    .unmatched
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(EngineError::Validation(format!(
                    "no template for results file(s): {}",
                    files.join(", ")
                )));
            }
            MissingTemplatePolicy::Skip => {
                for path in &discovery.unmatched {
                    warn!("Skipping {}", path.display());
                    reporter.report(Progress::PlateSkipped {
                        name: path.display().to_string(),
                    });
                }
            }
        }
    }
    if discovery.pairs.is_empty() {
        return Err(EngineError::InsufficientData(format!(
            "no results file with a template found in {}",
            config.input_dir.display()
        )));
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Per-plate interpretation ===
    reporter.report(Progress::PhaseStart { name: "Interpretation" });
    let total = discovery.pairs.len();
    reporter.report(Progress::TaskStart {
        total_steps: total as u64,
    });
    let plates: Vec<(u32, Vec<InteractionRecord>)> = if config.parallel {
        discovery
            .pairs
            .par_iter()
            .enumerate()
            .map(|(i, pair)| process_logged(i, total, pair, catalog, config, reporter))
            .collect::<Result<_, _>>()?
    } else {
        discovery
            .pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| process_logged(i, total, pair, catalog, config, reporter))
            .collect::<Result<_, _>>()?
    };
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Aggregation ===
    reporter.report(Progress::PhaseStart { name: "Aggregation" });
    let dataset = Dataset::merge(plates)?;
    info!(
        "Merged {} interactions from {} plate(s), {} duplicate(s)",
        dataset.records.len(),
        total,
        dataset.duplicates.len()
    );
    report_dataset_notes(&dataset, reporter);
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Export ===
    reporter.report(Progress::PhaseStart { name: "Export" });
    let exported = export(&dataset, &config.output_dir, &config.thresholds)?;
    reporter.report(Progress::PhaseFinish);

    Ok(ProcessingResult {
        dataset,
        skipped: discovery.unmatched,
        exported,
    })
}

use crate::core::io::template::{SCREEN_PLATE_TYPE, Template, TemplateFile, TemplateMetadata, fields};
use crate::core::io::traits::PlateFile;
use crate::core::naming::{
    PlateFileKind, PlateFileName, batch_name, screen_plate_name, screen_template_file_name,
    storage_bait_plate_name, storage_prey_plate_name, storage_template_file_name,
};
use crate::core::protein::{ProteinCatalog, ProteinRef};
use crate::core::screen::ScreenPlate;
use crate::core::storage::{
    BAIT_STORAGE_CAPACITY, BaitStoragePlate, PreyStoragePlate, StoragePlate, bait_plate_index,
    bait_plate_offset,
};
use crate::engine::config::ScreenConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A template written by one of the generation workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTemplate {
    pub plate_name: String,
    pub path: PathBuf,
}

fn batch_proteins(catalog: &ProteinCatalog, batch: u32) -> Result<Vec<ProteinRef>, EngineError> {
    let proteins = catalog.batch_proteins(batch);
    if proteins.is_empty() {
        return Err(EngineError::Validation(format!(
            "batch {} has no successfully cloned proteins",
            batch
        )));
    }
    debug!("Batch {} contains {} cloned proteins", batch, proteins.len());
    Ok(proteins)
}

fn storage_metadata(plate: &StoragePlate, batch: u32) -> TemplateMetadata {
    TemplateMetadata::new()
        .with(fields::PLATE_NAME, plate.name())
        .with(fields::PLATE_TYPE, plate.kind().plate_type())
        .with(fields::BATCH_NAME, batch_name(batch))
}

fn write_templates(
    output_dir: &Path,
    pending: Vec<(String, String, Template)>,
    reporter: &ProgressReporter,
) -> Result<Vec<GeneratedTemplate>, EngineError> {
    fs::create_dir_all(output_dir).map_err(|e| EngineError::io(output_dir, e))?;

    reporter.report(Progress::TaskStart {
        total_steps: pending.len() as u64,
    });
    let mut written = Vec::with_capacity(pending.len());
    for (plate_name, file_name, template) in pending {
        let path = output_dir.join(file_name);
        TemplateFile::write_to_path(&template, &path)
            .map_err(|e| EngineError::template(&path, e))?;
        info!("Saved template of {} to {}", plate_name, path.display());
        written.push(GeneratedTemplate { plate_name, path });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(written)
}

/// Lays out a batch on one prey storage plate and as many bait storage plates as needed, and
/// writes their templates to `output_dir`.
///
/// Nothing is written unless every plate of the batch can be built.
#[instrument(skip_all, name = "storage_templates_workflow", fields(batch = batch))]
pub fn storage_templates(
    catalog: &ProteinCatalog,
    batch: u32,
    output_dir: &Path,
    reporter: &ProgressReporter,
) -> Result<Vec<GeneratedTemplate>, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Layout" });
    let proteins = batch_proteins(catalog, batch)?;

    let mut plates = Vec::new();
    let prey = PreyStoragePlate::new(&proteins)?.with_name(storage_prey_plate_name(batch));
    plates.push(prey.plate().clone());
    for (index, baits) in proteins.chunks(BAIT_STORAGE_CAPACITY).enumerate() {
        let bait = BaitStoragePlate::new(baits)?.with_name(storage_bait_plate_name(batch, index + 1));
        plates.push(bait.plate().clone());
    }
    reporter.report(Progress::PhaseFinish);

    let pending = plates
        .iter()
        .map(|plate| {
            (
                plate.name().to_string(),
                storage_template_file_name(plate.name()),
                Template::from_storage_plate(plate, storage_metadata(plate, batch)),
            )
        })
        .collect();

    reporter.report(Progress::PhaseStart { name: "Export" });
    let written = write_templates(output_dir, pending, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "Generated {} storage templates for batch {}",
        written.len(),
        batch
    );
    Ok(written)
}

/// Screen plate files (templates and results) already present in `dir`.
pub fn existing_plate_files(dir: &Path) -> Result<Vec<PlateFileName>, EngineError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::io(dir, e))?;
        if let Some(parsed) = PlateFileName::from_path(&entry.path()) {
            files.push(parsed);
        }
    }
    Ok(files)
}

/// First plate id not used by any of `existing`.
pub fn next_plate_id(existing: &[PlateFileName]) -> u32 {
    existing
        .iter()
        .map(|file| file.plate_id)
        .max()
        .map_or(1, |max| max + 1)
}

/// Combines every bait batch with every prey batch on screen plates (two baits per plate) and
/// writes their templates.
///
/// Plate ids continue after the highest id found in the output directory, and batch pairs that
/// already have templates there are left alone. Nothing is written unless every plate can be
/// built.
#[instrument(skip_all, name = "screen_templates_workflow")]
pub fn screen_templates(
    catalog: &ProteinCatalog,
    config: &ScreenConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<GeneratedTemplate>, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Layout" });

    let existing = existing_plate_files(&config.output_dir)?;
    let done: HashSet<(u32, u32)> = existing
        .iter()
        .filter(|file| file.kind == PlateFileKind::Template)
        .map(|file| (file.bait_batch, file.prey_batch))
        .collect();
    let mut plate_id = next_plate_id(&existing);

    let mut pending = Vec::new();
    for &bait_batch in &config.bait_batches {
        for &prey_batch in &config.prey_batches {
            if done.contains(&(bait_batch, prey_batch)) {
                info!(
                    "Skipped screen templates for batches {} vs {}, already generated",
                    bait_batch, prey_batch
                );
                continue;
            }
            info!(
                "Generating screen templates for batches {} vs {}",
                bait_batch, prey_batch
            );

            let preys = batch_proteins(catalog, prey_batch)?;
            let prey_plate =
                PreyStoragePlate::new(&preys)?.with_name(storage_prey_plate_name(prey_batch));
            let baits = batch_proteins(catalog, bait_batch)?;

            for (chunk, pair) in baits.chunks(ScreenPlate::capacity()).enumerate() {
                let offset = chunk * ScreenPlate::capacity();
                let bait_plate_name =
                    storage_bait_plate_name(bait_batch, bait_plate_index(offset));
                let plate = ScreenPlate::new(
                    pair,
                    &bait_plate_name,
                    bait_plate_offset(offset),
                    &prey_plate,
                )?
                .with_name(screen_plate_name(plate_id));

                let metadata = TemplateMetadata::new()
                    .with(fields::PLATE_NAME, plate.name())
                    .with(fields::PLATE_TYPE, SCREEN_PLATE_TYPE)
                    .with(fields::TIMESHIFT, "")
                    .with(fields::BAIT_PLATE, plate.bait_plate_name())
                    .with(fields::PREY_PLATE, plate.prey_plate_name());
                pending.push((
                    plate.name().to_string(),
                    screen_template_file_name(plate_id, bait_batch, prey_batch),
                    Template::from_screen_plate(&plate, metadata),
                ));
                plate_id += 1;
            }
        }
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Export" });
    let written = write_templates(&config.output_dir, pending, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!("Generated {} screen templates", written.len());
    Ok(written)
}

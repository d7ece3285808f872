use platero::core::io::catalog::CatalogFile;
use platero::core::io::results::{PlateReads, ResultsFile, TimepointRow};
use platero::core::io::template::{TemplateFile, fields};
use platero::core::io::traits::PlateFile;
use platero::core::naming::RESULTS_SUFFIX;
use platero::core::plate::WellAddress;
use platero::core::protein::{CatalogEntry, ProteinCatalog, ProteinRef};
use platero::core::screen::{ControlMarker, InteractionSlot};
use platero::engine::config::{ProcessingConfig, ProcessingConfigBuilder, ScreenConfigBuilder};
use platero::engine::error::EngineError;
use platero::engine::progress::ProgressReporter;
use platero::workflows::{generate, process};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const TIMESHIFT: &str = "00:30:00";

fn protein(id: String, family: &str, index: usize) -> ProteinRef {
    ProteinRef {
        label: format!("{}{}", family, index),
        family: family.to_string(),
        subfamily: format!("{}-a", family),
        nickname: format!("{}_{}", family.to_lowercase(), index),
        ..ProteinRef::with_id(id)
    }
}

/// Batch 1: four baits. Batch 2: ten preys.
fn write_catalog(dir: &Path) -> ProteinCatalog {
    let mut entries = Vec::new();
    for i in 0..4 {
        entries.push(CatalogEntry {
            batch: 1,
            order: i as u32,
            protein: protein(format!("AT1G{:05}", i + 1), "NAC", i),
            cloned: true,
        });
    }
    for i in 0..10 {
        let family = if i % 2 == 0 { "ARF" } else { "MYB" };
        entries.push(CatalogEntry {
            batch: 2,
            order: i as u32,
            protein: protein(format!("AT2G{:05}", i + 1), family, i),
            cloned: true,
        });
    }
    let path = dir.join("proteins.csv");
    CatalogFile::write_to_path(&entries, &path).unwrap();
    CatalogFile::load(&path).unwrap()
}

/// Fills in the Timeshift of a template and writes a matching plate-reader export next to it.
fn fake_reads(template_path: &Path) -> PathBuf {
    let mut template = TemplateFile::read_from_path(template_path).unwrap();
    template.metadata.insert(fields::TIMESHIFT, TIMESHIFT);
    TemplateFile::write_to_path(&template, template_path).unwrap();

    let slots = template.screen_slots().unwrap();
    let value = |address: WellAddress| match slots.get(address) {
        InteractionSlot::Empty => None,
        InteractionSlot::Control {
            marker: ControlMarker::NegativeControl,
            ..
        } => Some(10.0),
        InteractionSlot::Control { .. } => Some(100.0),
        InteractionSlot::Pair { .. } => Some(5.0 + (address.index() % 7) as f64),
    };
    let wells: Vec<WellAddress> = WellAddress::all().collect();
    let reads = PlateReads {
        metadata: vec![("Instrument".to_string(), "Reader".to_string())],
        rows: vec![
            TimepointRow {
                timepoint: "0:00:00".to_string(),
                values: wells.iter().map(|_| Some(1.0)).collect(),
            },
            TimepointRow {
                timepoint: "0:30:00".to_string(),
                values: wells.iter().map(|w| value(*w)).collect(),
            },
        ],
        wells,
    };

    let file_name = template_path.file_name().unwrap().to_str().unwrap();
    let results_name = file_name.replace("_template.csv", RESULTS_SUFFIX);
    let results_path = template_path.with_file_name(results_name);
    ResultsFile::write_to_path(&reads, &results_path).unwrap();
    results_path
}

struct Screen {
    dir: TempDir,
    catalog: ProteinCatalog,
    templates: Vec<PathBuf>,
}

fn screen() -> Screen {
    let dir = tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let config = ScreenConfigBuilder::new()
        .output_dir(dir.path().join("plates"))
        .bait_batches(vec![1])
        .prey_batches(vec![2])
        .build()
        .unwrap();
    let templates: Vec<PathBuf> =
        generate::screen_templates(&catalog, &config, &ProgressReporter::new())
            .unwrap()
            .into_iter()
            .map(|t| t.path)
            .collect();
    for template in &templates {
        fake_reads(template);
    }
    Screen {
        dir,
        catalog,
        templates,
    }
}

fn processing_config(screen: &Screen, parallel: bool) -> ProcessingConfig {
    ProcessingConfigBuilder::new()
        .input_dir(screen.dir.path().join("plates"))
        .output_dir(screen.dir.path().join("out"))
        .parallel(parallel)
        .build()
        .unwrap()
}

#[test]
fn generated_plates_are_processed_into_exports() {
    let screen = screen();
    assert_eq!(screen.templates.len(), 2);

    let result = process::run(
        &screen.catalog,
        &processing_config(&screen, false),
        &ProgressReporter::new(),
    )
    .unwrap();

    let dataset = &result.dataset;
    assert_eq!(dataset.records.len(), 40);
    assert!(dataset.duplicates.is_empty());
    assert!(result.skipped.is_empty());
    assert!(dataset.records.iter().all(|r| {
        r.normalized_value.is_some() && r.z_score_plate.is_some() && r.z_score_global.is_some()
    }));

    let crosstab = dataset.crosstab();
    let baits: Vec<_> = crosstab.columns.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(baits, vec!["NAC0", "NAC1", "NAC2", "NAC3"]);
    assert_eq!(crosstab.rows.len(), 10);
    assert_eq!(crosstab.missing, 0);

    let out = screen.dir.path().join("out");
    let mut exported: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    exported.sort();
    assert_eq!(
        exported,
        vec![
            "interactions.csv",
            "interactions_Z4.csv",
            "interactions_Z4_crosstab.csv",
            "interactions_Z4_plate.csv",
            "interactions_Z4_plate_crosstab.csv",
            "interactions_Z6.csv",
            "interactions_Z6_crosstab.csv",
            "interactions_Z6_plate.csv",
            "interactions_Z6_plate_crosstab.csv",
            "interactions_crosstab.csv",
        ]
    );
    assert_eq!(result.exported.len(), 10);

    let table = fs::read_to_string(out.join("interactions.csv")).unwrap();
    assert_eq!(table.lines().count(), 41);
    assert!(table.lines().next().unwrap().starts_with("Bait,Prey,Normalized,Value,NC"));
}

#[test]
fn parallel_processing_matches_sequential() {
    let screen = screen();
    let reporter = ProgressReporter::new();
    let sequential = process::run(&screen.catalog, &processing_config(&screen, false), &reporter)
        .unwrap();
    let parallel =
        process::run(&screen.catalog, &processing_config(&screen, true), &reporter).unwrap();
    assert_eq!(sequential.dataset, parallel.dataset);
}

#[test]
fn asymmetric_plate_fails_the_whole_run() {
    let screen = screen();
    let path = &screen.templates[0];
    let mut template = TemplateFile::read_from_path(path).unwrap();
    let a7: WellAddress = "A7".parse().unwrap();
    let b7: WellAddress = "B7".parse().unwrap();
    let swapped = template.cells.get(a7).clone();
    template.cells.set(a7, template.cells.get(b7).clone());
    template.cells.set(b7, swapped);
    TemplateFile::write_to_path(&template, path).unwrap();

    let result = process::run(
        &screen.catalog,
        &processing_config(&screen, false),
        &ProgressReporter::new(),
    );

    match result {
        Err(EngineError::PlateFailed { source, .. }) => {
            assert!(matches!(*source, EngineError::Asymmetry(_)));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.exported)),
    }
    assert!(!screen.dir.path().join("out").join("interactions.csv").exists());
}

#[test]
fn template_without_timeshift_is_rejected() {
    let screen = screen();
    let path = &screen.templates[1];
    let mut template = TemplateFile::read_from_path(path).unwrap();
    template.metadata.insert(fields::TIMESHIFT, "");
    TemplateFile::write_to_path(&template, path).unwrap();

    let result = process::run(
        &screen.catalog,
        &processing_config(&screen, false),
        &ProgressReporter::new(),
    );
    match result {
        Err(EngineError::PlateFailed { plate, source }) => {
            assert!(plate.starts_with("plate_00002"));
            assert!(matches!(*source, EngineError::Validation(_)));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.exported)),
    }
}

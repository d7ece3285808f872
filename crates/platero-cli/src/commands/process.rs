use super::load_catalog;
use crate::cli::ProcessArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use platero::{engine::progress::ProgressReporter, workflows};
use std::path::Path;
use tracing::{info, warn};

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> Result<()> {
    let partial_config = PartialConfig::load(config_path)?;
    let catalog_path = partial_config.resolve_catalog(args.catalog.as_ref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;
    let catalog = load_catalog(&catalog_path)?;

    println!("Processing plate results in {}...", config.input_dir.display());
    info!("Invoking the processing workflow...");

    let progress_handler = CliProgressHandler::new();
    let callback = progress_handler.get_callback();
    let result = tokio::task::spawn_blocking(move || {
        let reporter = ProgressReporter::with_callback(callback);
        workflows::process::run(&catalog, &config, &reporter)
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Processing task failed: {}", e)))??;

    for skipped in &result.skipped {
        warn!("No template for {:?}; it was skipped.", skipped);
    }
    for duplicate in &result.dataset.duplicates {
        warn!(
            "Interaction {} was measured on plates {:?}",
            duplicate.key.as_str(),
            duplicate.plates
        );
    }

    println!(
        "Workflow complete. {} interaction(s), {} results file(s) skipped, {} note(s) reported.",
        result.dataset.records.len(),
        progress_handler.skipped_count(),
        progress_handler.note_count()
    );
    println!("{} file(s) written:", result.exported.len());
    for path in &result.exported {
        println!("  {}", path.display());
    }

    Ok(())
}

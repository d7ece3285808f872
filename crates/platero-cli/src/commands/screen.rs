use super::load_catalog;
use crate::cli::ScreenArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use platero::{
    engine::{config::ScreenConfigBuilder, progress::ProgressReporter},
    workflows,
};
use std::path::Path;
use tracing::{info, warn};

pub async fn run(args: ScreenArgs, config_path: Option<&Path>) -> Result<()> {
    let partial_config = PartialConfig::load(config_path)?;
    let catalog_path = partial_config.resolve_catalog(args.catalog.as_ref())?;
    let catalog = load_catalog(&catalog_path)?;

    let config = ScreenConfigBuilder::new()
        .output_dir(args.output.clone())
        .bait_batches(args.bait_batches.clone())
        .prey_batches(args.prey_batches.clone())
        .build()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Laying out screen plates...");
    info!("Invoking the screen template workflow...");
    let templates = tokio::task::block_in_place(|| {
        workflows::generate::screen_templates(&catalog, &config, &reporter)
    })?;

    if templates.is_empty() {
        warn!("Every requested batch combination already has templates.");
        println!("Nothing to do: every batch combination already has templates.");
    } else {
        println!("{} screen plate template(s) written:", templates.len());
        for template in &templates {
            println!("  {}", template.path.display());
        }
    }

    Ok(())
}

use super::load_catalog;
use crate::cli::StorageArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use platero::{engine::progress::ProgressReporter, workflows};
use std::path::Path;
use tracing::info;

pub async fn run(args: StorageArgs, config_path: Option<&Path>) -> Result<()> {
    let partial_config = PartialConfig::load(config_path)?;
    let catalog_path = partial_config.resolve_catalog(args.catalog.as_ref())?;
    let catalog = load_catalog(&catalog_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    for batch in &args.batches {
        println!("Laying out storage plates of batch {}...", batch);
        info!("Invoking the storage template workflow for batch {}", batch);
        let templates = tokio::task::block_in_place(|| {
            workflows::generate::storage_templates(&catalog, *batch, &args.output, &reporter)
        })?;
        for template in &templates {
            println!("  {} written to: {}", template.plate_name, template.path.display());
        }
    }

    Ok(())
}

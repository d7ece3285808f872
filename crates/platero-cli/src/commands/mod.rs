pub mod process;
pub mod screen;
pub mod storage;

use crate::error::Result;
use platero::core::io::catalog::CatalogFile;
use platero::core::protein::ProteinCatalog;
use platero::engine::error::EngineError;
use std::path::Path;
use tracing::info;

pub(crate) fn load_catalog(path: &Path) -> Result<ProteinCatalog> {
    info!("Loading protein catalog from {:?}", path);
    let catalog = CatalogFile::load(path).map_err(|e| EngineError::catalog(path, e))?;
    info!("Catalog holds {} cloned proteins.", catalog.len());
    Ok(catalog)
}

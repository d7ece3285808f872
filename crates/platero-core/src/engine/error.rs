use super::config::ConfigError;
use crate::core::io::catalog::CatalogError;
use crate::core::io::results::ResultsError;
use crate::core::io::template::TemplateError;
use crate::core::storage::CapacityError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Plate halves are not symmetric: {0}")]
    Asymmetry(String),

    #[error("Plate capacity error: {source}")]
    Capacity {
        #[from]
        source: CapacityError,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Failed to read template '{}': {source}", path.display())]
    Template { path: PathBuf, source: TemplateError },

    #[error("Failed to read results '{}': {source}", path.display())]
    Results { path: PathBuf, source: ResultsError },

    #[error("Failed to load protein catalog '{}': {source}", path.display())]
    Catalog { path: PathBuf, source: CatalogError },

    #[error("Failed to write '{}': {source}", path.display())]
    Export { path: PathBuf, source: csv::Error },

    #[error("I/O error on '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Plate '{plate}' failed: {source}")]
    PlateFailed {
        plate: String,
        source: Box<EngineError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn template(path: impl Into<PathBuf>, source: TemplateError) -> Self {
        Self::Template {
            path: path.into(),
            source,
        }
    }

    /// A missing timepoint is a data problem, not a format one.
    pub fn results(path: impl Into<PathBuf>, source: ResultsError) -> Self {
        let path = path.into();
        match source {
            ResultsError::TimepointNotFound { .. } => {
                Self::Validation(format!("{}: {}", path.display(), source))
            }
            source => Self::Results { path, source },
        }
    }

    pub fn catalog(path: impl Into<PathBuf>, source: CatalogError) -> Self {
        Self::Catalog {
            path: path.into(),
            source,
        }
    }

    pub fn export(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Export {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn plate_failed(plate: impl Into<String>, source: EngineError) -> Self {
        Self::PlateFailed {
            plate: plate.into(),
            source: Box::new(source),
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_THRESHOLDS: [u32; 2] = [4, 6];

/// What to do with a results file whose template cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTemplatePolicy {
    /// Report the plate and continue without it.
    Skip,
    /// Fail the whole run.
    #[default]
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Z-score multipliers of the threshold-filtered exports.
    pub thresholds: Vec<u32>,
    pub missing_template: MissingTemplatePolicy,
    /// Interpret plates on the rayon pool.
    pub parallel: bool,
    /// Check that template proteins belong to the batches named in the file name.
    pub validate_batches: bool,
}

#[derive(Default)]
pub struct ProcessingConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    thresholds: Option<Vec<u32>>,
    missing_template: Option<MissingTemplatePolicy>,
    parallel: Option<bool>,
    validate_batches: Option<bool>,
}

impl ProcessingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, path: PathBuf) -> Self {
        self.input_dir = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
    pub fn missing_template(mut self, policy: MissingTemplatePolicy) -> Self {
        self.missing_template = Some(policy);
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }
    pub fn validate_batches(mut self, validate: bool) -> Self {
        self.validate_batches = Some(validate);
        self
    }

    pub fn build(self) -> Result<ProcessingConfig, ConfigError> {
        let mut thresholds = self
            .thresholds
            .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_vec());
        if thresholds.contains(&0) {
            return Err(ConfigError::InvalidParameter {
                name: "thresholds",
                reason: "multipliers must be positive".to_string(),
            });
        }
        thresholds.sort_unstable();
        thresholds.dedup();

        Ok(ProcessingConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            thresholds,
            missing_template: self.missing_template.unwrap_or_default(),
            parallel: self.parallel.unwrap_or(false),
            validate_batches: self.validate_batches.unwrap_or(true),
        })
    }
}

/// Which batch pairs to lay out on screen plates, and where the templates go.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub output_dir: PathBuf,
    pub bait_batches: Vec<u32>,
    pub prey_batches: Vec<u32>,
}

#[derive(Default)]
pub struct ScreenConfigBuilder {
    output_dir: Option<PathBuf>,
    bait_batches: Option<Vec<u32>>,
    prey_batches: Option<Vec<u32>>,
}

impl ScreenConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn bait_batches(mut self, batches: Vec<u32>) -> Self {
        self.bait_batches = Some(batches);
        self
    }
    pub fn prey_batches(mut self, batches: Vec<u32>) -> Self {
        self.prey_batches = Some(batches);
        self
    }

    pub fn build(self) -> Result<ScreenConfig, ConfigError> {
        let non_empty = |name: &'static str, batches: Option<Vec<u32>>| {
            let batches = batches.ok_or(ConfigError::MissingParameter(name))?;
            if batches.is_empty() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "at least one batch id is required".to_string(),
                });
            }
            Ok(batches)
        };
        Ok(ScreenConfig {
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            bait_batches: non_empty("bait_batches", self.bait_batches)?,
            prey_batches: non_empty("prey_batches", self.prey_batches)?,
        })
    }
}

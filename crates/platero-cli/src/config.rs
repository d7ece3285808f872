use crate::cli::{MissingTemplate, ProcessArgs};
use crate::error::{CliError, Result};
use platero::engine::config::{ProcessingConfig, ProcessingConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialProcessingConfig {
    thresholds: Option<Vec<u32>>,
    #[serde(rename = "missing-template")]
    missing_template: Option<MissingTemplate>,
    parallel: Option<bool>,
    #[serde(rename = "validate-batches")]
    validate_batches: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    catalog: Option<PathBuf>,
    processing: Option<PartialProcessingConfig>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid boolean value for {}: {}", key, value))
    })
}

fn parse_thresholds(key: &str, value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(|part| {
            part.trim().parse().map_err(|_| {
                CliError::Config(format!("Invalid integer value for {}: {}", key, part))
            })
        })
        .collect()
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// The file at `path` when given, an empty configuration otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The catalog path from the command line, falling back to the file.
    pub fn resolve_catalog(&self, cli_value: Option<&PathBuf>) -> Result<PathBuf> {
        let path = cli_value.or(self.catalog.as_ref()).ok_or_else(|| {
            CliError::Config(
                "A protein catalog is required either in the config file (`catalog`) or via --catalog."
                    .to_string(),
            )
        })?;
        if !path.is_file() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Protein catalog does not exist: {}", path.display()),
            )));
        }
        Ok(path.clone())
    }

    pub fn merge_with_cli(mut self, args: &ProcessArgs) -> Result<ProcessingConfig> {
        self.apply_set_values(&args.set_values)?;
        let file = self.processing.take().unwrap_or_default();

        let mut builder = ProcessingConfigBuilder::new()
            .input_dir(args.input.clone())
            .output_dir(args.output.clone());

        if !args.thresholds.is_empty() {
            builder = builder.thresholds(args.thresholds.clone());
        } else if let Some(thresholds) = file.thresholds {
            builder = builder.thresholds(thresholds);
        }
        if let Some(policy) = args.missing_template.or(file.missing_template) {
            builder = builder.missing_template(policy.into());
        }
        builder = Self::merge_parallel(builder, args, file.parallel);
        if args.no_batch_check {
            builder = builder.validate_batches(false);
        } else if let Some(validate) = file.validate_batches {
            builder = builder.validate_batches(validate);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_parallel(
        builder: ProcessingConfigBuilder,
        args: &ProcessArgs,
        file_val: Option<bool>,
    ) -> ProcessingConfigBuilder {
        if args.parallel.parallel {
            builder.parallel(true)
        } else if args.parallel.sequential {
            builder.parallel(false)
        } else if let Some(val) = file_val {
            builder.parallel(val)
        } else {
            builder
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            let processing = self.processing.get_or_insert_with(Default::default);
            match key {
                "catalog" => self.catalog = Some(PathBuf::from(value_str)),
                "processing.thresholds" => {
                    processing.thresholds = Some(parse_thresholds(key, value_str)?);
                }
                "processing.missing-template" => {
                    processing.missing_template = Some(match value_str {
                        "skip" => MissingTemplate::Skip,
                        "abort" => MissingTemplate::Abort,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'skip' or 'abort')",
                                key, value_str
                            )));
                        }
                    });
                }
                "processing.parallel" => {
                    processing.parallel = Some(parse_bool(key, value_str)?);
                }
                "processing.validate-batches" => {
                    processing.validate_batches = Some(parse_bool(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use platero::engine::config::MissingTemplatePolicy;
    use std::fs;
    use tempfile::tempdir;

    fn process_args(extra: &[&str]) -> ProcessArgs {
        let mut args = vec!["platero", "process", "-i", "in", "-o", "out"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Process(args) => args,
            other => panic!("Expected 'process' subcommand, got {:?}", other),
        }
    }

    fn partial(content: &str) -> PartialConfig {
        let dir = tempdir().unwrap();
        let path = dir.path().join("platero.toml");
        fs::write(&path, content).unwrap();
        PartialConfig::from_file(&path).unwrap()
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = PartialConfig::load(None)
            .unwrap()
            .merge_with_cli(&process_args(&[]))
            .unwrap();
        assert_eq!(config.thresholds, vec![4, 6]);
        assert_eq!(config.missing_template, MissingTemplatePolicy::Abort);
        assert!(!config.parallel);
        assert!(config.validate_batches);
        assert_eq!(config.input_dir, PathBuf::from("in"));
    }

    #[test]
    fn file_values_are_used() {
        let config = partial(
            r#"
            catalog = "proteins.csv"
            [processing]
            thresholds = [3]
            missing-template = "skip"
            parallel = true
            validate-batches = false
            "#,
        );
        let merged = config.clone().merge_with_cli(&process_args(&[])).unwrap();
        assert_eq!(merged.thresholds, vec![3]);
        assert_eq!(merged.missing_template, MissingTemplatePolicy::Skip);
        assert!(merged.parallel);
        assert!(!merged.validate_batches);
        assert_eq!(config.catalog, Some(PathBuf::from("proteins.csv")));
    }

    #[test]
    fn cli_overrides_set_values_which_override_the_file() {
        let config = partial(
            r#"
            [processing]
            thresholds = [3]
            parallel = true
            "#,
        );
        let args = process_args(&[
            "-S",
            "processing.thresholds=5,7",
            "-S",
            "processing.missing-template=skip",
            "--sequential",
        ]);
        let merged = config.merge_with_cli(&args).unwrap();
        assert_eq!(merged.thresholds, vec![5, 7]);
        assert_eq!(merged.missing_template, MissingTemplatePolicy::Skip);
        assert!(!merged.parallel);

        let args = process_args(&["-S", "processing.thresholds=5", "-t", "2"]);
        let merged = PartialConfig::default().merge_with_cli(&args).unwrap();
        assert_eq!(merged.thresholds, vec![2]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[processing]\nthreshold = [3]\n").unwrap();
        assert!(matches!(
            PartialConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let args = process_args(&["-S", "processing.colour=red"]);
        assert!(matches!(
            PartialConfig::default().merge_with_cli(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for set in ["processing.parallel=maybe", "processing.thresholds=4,x", "no-equals"] {
            let args = process_args(&["-S", set]);
            assert!(matches!(
                PartialConfig::default().merge_with_cli(&args),
                Err(CliError::Config(_))
            ));
        }
        let args = process_args(&["-t", "0"]);
        assert!(matches!(
            PartialConfig::default().merge_with_cli(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn catalog_must_be_configured_and_exist() {
        let config = PartialConfig::default();
        assert!(matches!(config.resolve_catalog(None), Err(CliError::Config(_))));

        let dir = tempdir().unwrap();
        let path = dir.path().join("proteins.csv");
        assert!(matches!(
            config.resolve_catalog(Some(&path)),
            Err(CliError::Io(_))
        ));
        fs::write(&path, "").unwrap();
        assert_eq!(config.resolve_catalog(Some(&path)).unwrap(), path);
    }
}

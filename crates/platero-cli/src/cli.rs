use clap::{Args, Parser, Subcommand, ValueEnum};
use platero::engine::config::MissingTemplatePolicy;
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Platero developers",
    version,
    about = "Platero CLI - Plate layouts, templates and result normalization for 96-well protein-protein interaction screens.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel plate processing.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the prey and bait storage plate templates of one or more batches.
    Storage(StorageArgs),
    /// Generate the screen plate templates for every bait batch x prey batch combination.
    Screen(ScreenArgs),
    /// Interpret plate-reader results and export normalized interaction tables.
    Process(ProcessArgs),
}

/// Arguments for the `storage` subcommand.
#[derive(Args, Debug)]
pub struct StorageArgs {
    /// Id(s) of the batch(es) to lay out, as a comma separated list.
    #[arg(required = true, value_delimiter = ',', value_name = "BATCH_IDS")]
    pub batches: Vec<u32>,

    /// Directory where the templates will be saved.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Override the protein catalog CSV from the config file.
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

/// Arguments for the `screen` subcommand.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Id(s) of the batch(es) to use as BAIT, as a comma separated list.
    #[arg(short, long = "bait", required = true, value_delimiter = ',', value_name = "IDS")]
    pub bait_batches: Vec<u32>,

    /// Id(s) of the batch(es) to use as PREY, as a comma separated list.
    #[arg(short, long = "prey", required = true, value_delimiter = ',', value_name = "IDS")]
    pub prey_batches: Vec<u32>,

    /// Directory where the templates will be saved.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Override the protein catalog CSV from the config file.
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

/// What to do with results files that have no template.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingTemplate {
    /// Report the file and continue without it.
    Skip,
    /// Stop before processing anything.
    Abort,
}

impl From<MissingTemplate> for MissingTemplatePolicy {
    fn from(value: MissingTemplate) -> Self {
        match value {
            MissingTemplate::Skip => MissingTemplatePolicy::Skip,
            MissingTemplate::Abort => MissingTemplatePolicy::Abort,
        }
    }
}

/// Arguments for the `process` subcommand.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Directory searched (recursively) for `*_results.csv` files and their templates.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory where the interaction tables will be saved.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Override the protein catalog CSV from the config file.
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Z-score multiplier(s) of the threshold-filtered exports, as a comma separated list.
    #[arg(short, long = "threshold", value_delimiter = ',', value_name = "M")]
    pub thresholds: Vec<u32>,

    /// Override `processing.missing-template` from the config file.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub missing_template: Option<MissingTemplate>,

    /// Override `processing.parallel` from the config file.
    #[command(flatten)]
    pub parallel: ParallelMode,

    /// Do not check that template proteins belong to the batches named in the file name.
    #[arg(long)]
    pub no_batch_check: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S processing.thresholds=3,5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive flags for parallel plate processing.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct ParallelMode {
    /// Process plates in parallel.
    #[arg(long)]
    pub parallel: bool,
    /// Process plates one after the other.
    #[arg(long)]
    pub sequential: bool,
}

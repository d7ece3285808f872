use crate::error::{CliError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::LookupSpan,
};

/// Level of the stderr output: `-v` steps up from WARN, `--quiet` silences it.
pub fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The log file never records less than INFO, whatever the console shows.
pub fn file_level(console: LevelFilter) -> LevelFilter {
    console.max(LevelFilter::INFO)
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Plain-text layer for the run log; closing spans are recorded with their timings.
fn file_layer<S>(file: File, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(level)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let console = console_level(verbosity, quiet);
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console);

    let run_log = log_file
        .as_deref()
        .map(open_log_file)
        .transpose()?
        .map(|file| file_layer(file, file_level(console)));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(run_log)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install the logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, info_span};

    #[test]
    fn console_level_follows_verbosity_and_quiet() {
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(1, false), LevelFilter::INFO);
        assert_eq!(console_level(2, false), LevelFilter::DEBUG);
        assert_eq!(console_level(7, false), LevelFilter::TRACE);
        assert_eq!(console_level(3, true), LevelFilter::OFF);
    }

    #[test]
    fn log_file_keeps_at_least_info() {
        assert_eq!(file_level(LevelFilter::OFF), LevelFilter::INFO);
        assert_eq!(file_level(LevelFilter::WARN), LevelFilter::INFO);
        assert_eq!(file_level(LevelFilter::TRACE), LevelFilter::TRACE);
    }

    #[test]
    #[serial]
    fn file_layer_records_workflow_spans_in_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/2026/platero.log");
        let file = open_log_file(&path).unwrap();
        let subscriber = tracing_subscriber::registry().with(file_layer(file, LevelFilter::INFO));

        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("processing_workflow");
            let _entered = span.enter();
            info!("Merged 40 interactions from 2 plate(s)");
            debug!("Interpreted well A1");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Merged 40 interactions from 2 plate(s)"));
        assert!(content.contains("processing_workflow"));
        assert!(content.contains("close"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains("Interpreted well A1"));
    }

    #[test]
    fn log_file_path_that_is_a_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(open_log_file(dir.path()), Err(CliError::Io(_))));
    }

    #[test]
    #[serial]
    fn quiet_runs_still_fill_the_log_file_and_install_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        setup_logging(0, true, Some(path.clone())).unwrap();
        info!("Processing results plate (1/1)");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Processing results plate (1/1)"));
        assert!(matches!(setup_logging(0, false, None), Err(CliError::Other(_))));
    }
}

// ============================================================================
// avstyle-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: fern dispatch for console and optional file output
//
// Console output goes to stderr so that `inspect` can print JSON on stdout.
// With `--log-dir`, the same records are also written to a timestamped file.
//
// LEVELS:
// - default: info (transcoder progress lines, warnings, errors)
// - --verbose: debug (adds executed commands and state transitions)

use crate::error::{CliErrorContext, CliResult};
use avstyle_core::CoreError;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Returns the log file path when one was opened.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level_for(verbose))
        .chain(std::io::stderr());

    let mut log_path = None;
    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)
            .cli_with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
        let path = dir.join(format!("avstyle_run_{}.log", get_timestamp()));
        let file = fern::log_file(&path)
            .cli_with_context(|| format!("Failed to open log file '{}'", path.display()))?;
        dispatch = dispatch.chain(file);
        log_path = Some(path);
    }

    dispatch
        .apply()
        .map_err(|e| CoreError::Configuration(format!("Failed to initialize logging: {e}")))?;
    Ok(log_path)
}

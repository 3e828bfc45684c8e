// ============================================================================
// avstyle-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the avstyle core library
//
// KEY COMPONENTS:
// - CoreError: every failure the library can surface
// - CoreResult: result alias used throughout the crate
// - Helper constructors for external command failures
//
// Unsupported media is NOT an error: it is a classification handled by the
// transcoder through a pass-through copy.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for avstyle-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed geometry or option values. Never gated by `whiny`.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The engine ran and exited unsuccessfully.
    #[error("error while transcoding {basename}: {detail}")]
    TranscodeExecution { basename: String, detail: String },

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata store error: {0}")]
    MetadataStore(String),

    #[error("Path error: {0}")]
    PathError(String),
}

/// Result type for avstyle-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

pub fn command_start_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), err)
}

pub fn command_wait_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), err)
}

pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        status,
        stderr: stderr.into(),
    }
}

/// Shorthand for `CoreError::Configuration`.
pub fn config_error(msg: impl Into<String>) -> CoreError {
    CoreError::Configuration(msg.into())
}

// ============================================================================
// avstyle-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external transcoding
// engine. The transcoder only sees the traits defined here, so tests can swap
// in the mocks and embedders can swap in their own backends.
//
// KEY COMPONENTS:
// - TranscodeCommandBuilder: builder-style accumulation of engine arguments
// - FfmpegSpawner / FfmpegProcess: running the engine (ffmpeg-sidecar)
// - MediaProber: probing sources and measuring outputs (ffprobe CLI)
// - Dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Builder turning a job spec into ffmpeg arguments
pub mod ffmpeg_builder;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Traits and implementations for probing media with ffprobe
pub mod ffprobe_executor;

/// Mock spawner and prober for tests
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::TranscodeCommandBuilder;
pub use ffmpeg_executor::{
    ExecutionOutcome, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, run_transcode,
};
pub use ffprobe_executor::{FfprobeCli, MediaProber};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that `cmd_name` can be started, by running it with `-version`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

/// Checks for both ffmpeg and ffprobe.
pub fn check_dependencies() -> CoreResult<()> {
    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")
}

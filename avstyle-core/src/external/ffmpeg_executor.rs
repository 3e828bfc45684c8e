// ============================================================================
// avstyle-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes, and the single entry point the transcoder uses to execute a job.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_transcode: executes one job and classifies the outcome
//
// A non-zero exit is reported as ExecutionOutcome::Failed rather than an
// error, so the caller can apply its own failure policy. Failing to start or
// wait for the process is always an error.

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::external::ffmpeg_builder::TranscodeCommandBuilder;
use crate::job::TranscodeJobSpec;
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error("ffmpeg (event iterator)", ExitStatus::default(), e.to_string())
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}

// --- Job Execution ---

/// How a single engine run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed { status: ExitStatus, detail: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded)
    }
}

/// Executes `job` once. No retries, no timeout.
pub fn run_transcode<S: FfmpegSpawner>(spawner: &S, job: &TranscodeJobSpec) -> CoreResult<ExecutionOutcome> {
    let cmd = TranscodeCommandBuilder::from_job(job).build()?;

    let mut process = spawner.spawn(cmd)?;
    let mut error_lines: Vec<String> = Vec::new();
    process.handle_events(|event| {
        match event {
            FfmpegEvent::Error(line) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                log::debug!("ffmpeg: {}", line);
                error_lines.push(line);
            }
            FfmpegEvent::Log(_, line) => log::trace!("ffmpeg: {}", line),
            _ => {}
        }
        Ok(())
    })?;
    let status = process.wait()?;

    if status.success() {
        return Ok(ExecutionOutcome::Succeeded);
    }

    let detail = match error_lines.last() {
        Some(line) => format!("{status}: {line}"),
        None => status.to_string(),
    };
    log::error!(
        "ffmpeg failed for {}: {}",
        job.source_path().display(),
        detail
    );
    Ok(ExecutionOutcome::Failed { status, detail })
}

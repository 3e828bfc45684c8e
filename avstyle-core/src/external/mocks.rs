// avstyle-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// This module is only compiled when the "test-mocks" feature is enabled.
#![cfg(feature = "test-mocks")]

use super::{FfmpegProcess, FfmpegSpawner, MediaProber};
use crate::error::{CoreError, CoreResult};
use crate::metadata::{MeasuredDimensions, SourceMetadata};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    events: Vec<FfmpegEvent>,
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

enum MockRun {
    /// Exit 0, optionally writing these bytes to the destination.
    Success(Option<Vec<u8>>),
    /// Exit with the given code after emitting the error lines.
    Exit(i32, Vec<String>),
    SpawnError(String),
}

/// Mock implementation of FfmpegSpawner.
///
/// Each spawn consumes the next queued run; spawning with an empty queue
/// panics so unexpected invocations fail the test loudly.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    runs: Rc<RefCell<VecDeque<MockRun>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Queues a successful run that writes `output` to the destination.
    pub fn add_success(&self, output: &[u8]) {
        self.runs
            .borrow_mut()
            .push_back(MockRun::Success(Some(output.to_vec())));
    }

    /// Queues a successful run that leaves the destination untouched.
    pub fn add_success_without_output(&self) {
        self.runs.borrow_mut().push_back(MockRun::Success(None));
    }

    pub fn add_exit_error(&self, exit_code: i32, error_lines: &[&str]) {
        self.runs.borrow_mut().push_back(MockRun::Exit(
            exit_code,
            error_lines.iter().map(|l| l.to_string()).collect(),
        ));
    }

    pub fn add_spawn_error(&self, message: &str) {
        self.runs
            .borrow_mut()
            .push_back(MockRun::SpawnError(message.to_string()));
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let run = self.runs.borrow_mut().pop_front().unwrap_or_else(|| {
            panic!("MockFfmpegSpawner: no run queued for command args: {args:?}")
        });

        match run {
            MockRun::Success(output) => {
                if let (Some(bytes), Some(destination)) = (output, args.last()) {
                    std::fs::write(destination, bytes)?;
                    log::info!("MockFfmpegSpawner wrote dummy output: {}", destination);
                }
                Ok(MockFfmpegProcess {
                    events: vec![FfmpegEvent::Done],
                    exit_status: ExitStatus::from_raw(0),
                })
            }
            MockRun::Exit(code, lines) => Ok(MockFfmpegProcess {
                events: lines.into_iter().map(FfmpegEvent::Error).collect(),
                // Wait statuses carry the exit code in the second byte.
                exit_status: ExitStatus::from_raw(code << 8),
            }),
            MockRun::SpawnError(message) => Err(CoreError::CommandStart(
                "ffmpeg (mock)".to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, message),
            )),
        }
    }
}

/// Mock implementation of MediaProber.
#[derive(Clone, Default)]
pub struct MockMediaProber {
    identify_results: Rc<RefCell<HashMap<PathBuf, Option<SourceMetadata>>>>,
    measurement: Rc<RefCell<Option<MeasuredDimensions>>>,
    identify_calls: Rc<RefCell<Vec<PathBuf>>>,
    measure_calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockMediaProber {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the probe result for `path`; `None` marks it unsupported.
    pub fn expect_identify(&self, path: &Path, result: Option<SourceMetadata>) {
        self.identify_results
            .borrow_mut()
            .insert(path.to_path_buf(), result);
    }

    /// Sets the dimensions returned by every `measure` call.
    pub fn set_measurement(&self, measured: MeasuredDimensions) {
        *self.measurement.borrow_mut() = Some(measured);
    }

    pub fn identify_calls(&self) -> Vec<PathBuf> {
        self.identify_calls.borrow().clone()
    }

    pub fn measure_calls(&self) -> Vec<PathBuf> {
        self.measure_calls.borrow().clone()
    }
}

impl MediaProber for MockMediaProber {
    fn identify(&self, path: &Path) -> CoreResult<Option<SourceMetadata>> {
        self.identify_calls.borrow_mut().push(path.to_path_buf());
        match self.identify_results.borrow().get(path) {
            Some(result) => Ok(result.clone()),
            None => {
                log::error!("MockMediaProber: no expectation set for {}", path.display());
                Err(CoreError::Probe(format!(
                    "MockMediaProber: no expectation set for {}",
                    path.display()
                )))
            }
        }
    }

    fn measure(&self, path: &Path) -> CoreResult<MeasuredDimensions> {
        self.measure_calls.borrow_mut().push(path.to_path_buf());
        self.measurement.borrow().ok_or_else(|| {
            CoreError::Probe(format!("MockMediaProber: no measurement for {}", path.display()))
        })
    }
}

// ============================================================================
// avstyle-core/src/transcoder.rs
// ============================================================================
//
// TRANSCODER: One source file, one style, one engine run
//
// This module houses the orchestration logic: it classifies the source,
// builds the job, runs the engine once and records metadata for the style.
//
// WORKFLOW:
// 1. Validate options and parse the geometry (fail fast, nothing spawned)
// 2. Probe the source; an empty probe means "not media"
// 3. Unsupported: copy the bytes through, no metadata
// 4. Supported: allocate the destination temp file, build and run the job
// 5. Failure: error when whiny, otherwise hand back the original source
// 6. Success: measure the output, merge {source, output} under the style
//
// Every temp file is owned by a NamedTempFile, so early returns remove it
// and successful runs hand ownership to the caller.

// ---- Internal crate imports ----
use crate::config::{TranscodeOptions, TranscoderConfig};
use crate::error::{CoreError, CoreResult};
use crate::external::{
    ExecutionOutcome, FfmpegSpawner, FfprobeCli, MediaProber, SidecarSpawner, run_transcode,
};
use crate::geometry::GeometryDirective;
use crate::job::build_job;
use crate::logging::{LogSink, default_sink};
use crate::metadata::{MetadataRecord, SourceMetadata};
use crate::store::Attachment;

// ---- External crate imports ----
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

// ---- Standard library imports ----
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

// ============================================================================
// STATES AND RESULTS
// ============================================================================

/// Stages of a run, in order. Logged at debug level as the run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeState {
    Probing,
    Supported,
    Unsupported,
    Executing,
    Succeeded,
    Failed,
    MetadataMerge,
    Done,
}

/// What a run hands back to the caller.
#[derive(Debug)]
pub enum TranscodeOutput {
    /// The engine produced a new file; `record` is what was (or would have
    /// been) merged into the attachment.
    Transcoded {
        file: NamedTempFile,
        record: MetadataRecord,
    },
    /// The source was not media; this is a byte-for-byte copy.
    Copied(NamedTempFile),
    /// The engine failed and `whiny` was off; this is the untouched source.
    Source(PathBuf),
}

impl TranscodeOutput {
    pub fn path(&self) -> &Path {
        match self {
            TranscodeOutput::Transcoded { file, .. } => file.path(),
            TranscodeOutput::Copied(file) => file.path(),
            TranscodeOutput::Source(path) => path,
        }
    }

    pub fn is_transcoded(&self) -> bool {
        matches!(self, TranscodeOutput::Transcoded { .. })
    }

    pub fn record(&self) -> Option<&MetadataRecord> {
        match self {
            TranscodeOutput::Transcoded { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Moves (or copies) the result to `target`.
    ///
    /// Temp files are renamed when possible and copied across filesystems;
    /// a returned source is always copied, never moved.
    pub fn persist(self, target: &Path) -> CoreResult<()> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        match self {
            TranscodeOutput::Transcoded { file, .. } | TranscodeOutput::Copied(file) => {
                if let Err(e) = file.persist(target) {
                    log::debug!("Rename failed ({}), copying instead", e.error);
                    fs::copy(e.file.path(), target)?;
                }
            }
            TranscodeOutput::Source(path) => {
                fs::copy(&path, target)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// TRANSCODER
// ============================================================================

/// Runs style transcodes against a spawner and a prober.
///
/// # Examples
///
/// ```rust,no_run
/// use avstyle_core::config::TranscodeOptions;
/// use avstyle_core::store::{Attachment, MemoryMetadataStore};
/// use avstyle_core::transcoder::Transcoder;
/// use std::path::Path;
///
/// let transcoder = Transcoder::with_defaults();
/// let options = TranscodeOptions::builder()
///     .style("thumb")
///     .geometry("320x240#")
///     .format("mp4")
///     .build();
///
/// let mut store = MemoryMetadataStore::new();
/// let mut attachment = Attachment::new(&mut store);
/// let output = transcoder
///     .run(Path::new("clip.mov"), &options, Some(&mut attachment))
///     .unwrap();
/// output.persist(Path::new("clip-thumb.mp4")).unwrap();
/// ```
pub struct Transcoder<S: FfmpegSpawner, P: MediaProber> {
    spawner: S,
    prober: P,
    config: TranscoderConfig,
    log: LogSink,
}

impl Transcoder<SidecarSpawner, FfprobeCli> {
    /// ffmpeg-sidecar for execution, the ffprobe CLI for probing.
    pub fn with_defaults() -> Self {
        Self::new(SidecarSpawner, FfprobeCli::new())
    }
}

impl<S: FfmpegSpawner, P: MediaProber> Transcoder<S, P> {
    pub fn new(spawner: S, prober: P) -> Self {
        Self {
            spawner,
            prober,
            config: TranscoderConfig::default(),
            log: default_sink(),
        }
    }

    pub fn with_config(mut self, config: TranscoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the progress sink (defaults to `log::info!`).
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log = sink;
        self
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    fn log(&self, message: &str) {
        (self.log)(message);
    }

    fn enter(&self, state: TranscodeState, source: &Path) {
        log::debug!("{}: {:?}", source.display(), state);
    }

    /// Transcodes `source` into the style described by `options`.
    ///
    /// With an attachment, a successful run merges its record under
    /// `options.style`; sibling styles are preserved.
    pub fn run(
        &self,
        source: &Path,
        options: &TranscodeOptions,
        attachment: Option<&mut Attachment<'_>>,
    ) -> CoreResult<TranscodeOutput> {
        options.validate()?;
        let geometry = GeometryDirective::parse(options.geometry.as_deref())?;
        let basename = basename_of(source);

        self.enter(TranscodeState::Probing, source);
        let probed = self.prober.identify(source)?.filter(|meta| !meta.is_empty());

        let Some(source_meta) = probed else {
            self.enter(TranscodeState::Unsupported, source);
            self.log(&format!("{basename} is not a supported media file, passing it through"));
            let copy = self.copy_through(source, &basename)?;
            self.enter(TranscodeState::Done, source);
            return Ok(TranscodeOutput::Copied(copy));
        };
        self.enter(TranscodeState::Supported, source);

        let destination = self.allocate(&basename, options.format.as_deref().map(|f| format!(".{f}")))?;
        let job = build_job(
            options,
            geometry.as_ref(),
            source,
            destination.path(),
            &source_meta,
        );

        self.enter(TranscodeState::Executing, source);
        if let ExecutionOutcome::Failed { detail, .. } = run_transcode(&self.spawner, &job)? {
            self.enter(TranscodeState::Failed, source);
            if options.whiny {
                return Err(CoreError::TranscodeExecution { basename, detail });
            }
            self.log(&format!(
                "transcoding {basename} failed ({detail}); returning the original file"
            ));
            self.enter(TranscodeState::Done, source);
            return Ok(TranscodeOutput::Source(source.to_path_buf()));
        }
        self.enter(TranscodeState::Succeeded, source);

        let record = self.capture_metadata(source_meta, destination.path())?;

        if let Some(attachment) = attachment {
            self.enter(TranscodeState::MetadataMerge, source);
            attachment.merge_style(&options.style, &record)?;
            log::debug!(
                "Merged metadata for style '{}' into field '{}'",
                options.style,
                attachment.field()
            );
        }

        self.log(&format!(
            "Successfully transcoded {} to {}",
            basename,
            destination.path().display()
        ));
        self.enter(TranscodeState::Done, source);
        Ok(TranscodeOutput::Transcoded {
            file: destination,
            record,
        })
    }

    /// Measures the output. Outputs without a video stream (audio styles)
    /// keep `output` empty instead of failing the run.
    fn capture_metadata(&self, source: SourceMetadata, destination: &Path) -> CoreResult<MetadataRecord> {
        let record = MetadataRecord::new(source);
        match self.prober.measure(destination) {
            Ok(measured) => Ok(record.with_output(measured)),
            Err(CoreError::Probe(reason)) => {
                log::warn!("Could not measure {}: {}", destination.display(), reason);
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }

    fn allocate(&self, basename: &str, suffix: Option<String>) -> CoreResult<NamedTempFile> {
        let suffix = suffix.unwrap_or_default();
        let mut builder = TempFileBuilder::new();
        builder.prefix(basename).suffix(&suffix);
        let file = match &self.config.temp_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        Ok(file)
    }

    fn copy_through(&self, source: &Path, basename: &str) -> CoreResult<NamedTempFile> {
        let extension = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()));
        let mut copy = self.allocate(basename, extension)?;
        let mut input = File::open(source)?;
        io::copy(&mut input, copy.as_file_mut())?;
        copy.as_file().sync_all()?;
        Ok(copy)
    }
}

fn basename_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "source".to_string())
}

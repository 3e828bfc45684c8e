//! Builder-style accumulation of ffmpeg arguments.
//!
//! Mirrors the classic "cli" workflow: add a source, add a destination,
//! reset the input filters, then push input and output parameters one by
//! one. [`TranscodeCommandBuilder::from_job`] performs that sequence for a
//! [`TranscodeJobSpec`].

use crate::error::{CoreResult, config_error};
use crate::job::TranscodeJobSpec;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Accumulates the arguments of one ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct TranscodeCommandBuilder {
    sources: Vec<PathBuf>,
    destination: Option<PathBuf>,
    seek: Option<Duration>,
    input_params: Vec<String>,
    output_params: Vec<String>,
    hide_banner: bool,
}

impl Default for TranscodeCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscodeCommandBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            destination: None,
            seek: None,
            input_params: Vec::new(),
            output_params: Vec::new(),
            hide_banner: true,
        }
    }

    /// Applies a job spec in the canonical order.
    pub fn from_job(job: &TranscodeJobSpec) -> Self {
        let mut builder = Self::new();
        builder
            .add_source(job.source_path())
            .add_destination(job.destination_path())
            .reset_input_filters();
        if let Some(seek) = job.seek_time() {
            builder.seek(seek);
        }
        for flag in job.input_params() {
            builder.add_input_param(flag.as_str());
        }
        for (flag, value) in job.output_params().iter() {
            builder.add_output_param(flag, value);
        }
        builder
    }

    pub fn add_source(&mut self, path: &Path) -> &mut Self {
        self.sources.push(path.to_path_buf());
        self
    }

    pub fn add_destination(&mut self, path: &Path) -> &mut Self {
        self.destination = Some(path.to_path_buf());
        self
    }

    /// Drops every input parameter accumulated so far.
    pub fn reset_input_filters(&mut self) -> &mut Self {
        self.input_params.clear();
        self.seek = None;
        self
    }

    /// Seeks the input before decoding (`-ss` ahead of `-i`).
    pub fn seek(&mut self, offset: Duration) -> &mut Self {
        self.seek = Some(offset);
        self
    }

    /// Adds one raw input argument, emitted before the sources.
    pub fn add_input_param(&mut self, flag: impl Into<String>) -> &mut Self {
        self.input_params.push(flag.into());
        self
    }

    /// Adds `-flag value`; an empty value emits the flag alone.
    pub fn add_output_param(&mut self, flag: &str, value: &str) -> &mut Self {
        let flag = flag.trim_start_matches('-');
        self.output_params.push(format!("-{flag}"));
        if !value.is_empty() {
            self.output_params.push(value.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// The full argument list, destination last.
    pub fn args(&self) -> CoreResult<Vec<String>> {
        if self.sources.is_empty() {
            return Err(config_error("transcode command has no source"));
        }
        let destination = self
            .destination
            .as_ref()
            .ok_or_else(|| config_error("transcode command has no destination"))?;

        let mut args = Vec::new();
        if self.hide_banner {
            args.push("-hide_banner".to_string());
        }
        // The destination is a preallocated temp file.
        args.push("-y".to_string());
        if let Some(seek) = self.seek {
            args.push("-ss".to_string());
            args.push(format!("{:.3}", seek.as_secs_f64()));
        }
        args.extend(self.input_params.iter().cloned());
        for source in &self.sources {
            args.push("-i".to_string());
            args.push(source.to_string_lossy().into_owned());
        }
        args.extend(self.output_params.iter().cloned());
        args.push(destination.to_string_lossy().into_owned());
        Ok(args)
    }

    /// Builds the ffmpeg-sidecar command.
    pub fn build(&self) -> CoreResult<FfmpegCommand> {
        let args = self.args()?;
        log::debug!("Built ffmpeg command: ffmpeg {}", args.join(" "));
        let mut cmd = FfmpegCommand::new();
        cmd.args(args);
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscodeOptions;
    use crate::geometry::GeometryDirective;
    use crate::job::build_job;
    use crate::metadata::SourceMetadata;

    #[test]
    fn test_builder_orders_arguments() {
        let mut builder = TranscodeCommandBuilder::new();
        builder
            .add_input_param("-stale")
            .add_source(Path::new("/in/clip.mov"))
            .add_destination(Path::new("/tmp/out.mp4"))
            .reset_input_filters()
            .add_input_param("-re")
            .add_output_param("vcodec", "libx264")
            .add_output_param("-an", "");

        assert_eq!(
            builder.args().unwrap(),
            vec![
                "-hide_banner", "-y", "-re", "-i", "/in/clip.mov", "-vcodec", "libx264", "-an",
                "/tmp/out.mp4",
            ]
        );
    }

    #[test]
    fn test_builder_requires_source_and_destination() {
        assert!(TranscodeCommandBuilder::new().args().is_err());

        let mut no_destination = TranscodeCommandBuilder::new();
        no_destination.add_source(Path::new("a.mov"));
        assert!(no_destination.args().is_err());
    }

    #[test]
    fn test_from_job_places_seek_before_input() {
        let options = TranscodeOptions::builder()
            .geometry("320x240#")
            .format("jpg")
            .seek_secs(1.5)
            .build();
        let geometry = GeometryDirective::parse(options.geometry.as_deref()).unwrap();
        let job = build_job(
            &options,
            geometry.as_ref(),
            Path::new("clip.mov"),
            Path::new("thumb.jpg"),
            &SourceMetadata::default(),
        );

        let args = TranscodeCommandBuilder::from_job(&job)
            .with_hide_banner(false)
            .args()
            .unwrap();
        assert_eq!(
            args,
            vec![
                "-y", "-ss", "1.500", "-i", "clip.mov", "-s", "320x240", "thumb.jpg",
            ]
        );
        assert!(!args.iter().any(|a| a == "-frames:v"));
    }
}

//! FFprobe integration for source probing and output measurement
//!
//! [`MediaProber`] is the seam the transcoder probes through. [`FfprobeCli`]
//! runs `ffprobe -print_format json` and deserializes the parts of the
//! report the metadata records need.

use crate::error::{CoreError, CoreResult, command_start_error};
use crate::logging::log_command;
use crate::metadata::{MeasuredDimensions, SourceMetadata};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Probing collaborator used by the transcoder.
pub trait MediaProber {
    /// Probes a source. `Ok(None)` means the file is not media the engine
    /// understands; only a failure to run the probe itself is an error.
    fn identify(&self, path: &Path) -> CoreResult<Option<SourceMetadata>>;

    /// Measures the primary video stream of a transcoded file.
    fn measure(&self, path: &Path) -> CoreResult<MeasuredDimensions>;
}

/// `MediaProber` backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeCli {
    program: PathBuf,
}

impl Default for FfprobeCli {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeCli {
    pub fn new() -> Self {
        Self::with_program("ffprobe")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, path: &Path) -> CoreResult<Option<Vec<u8>>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path);
        log_command(&cmd);

        let output = cmd
            .output()
            .map_err(|e| command_start_error(self.program.to_string_lossy(), e))?;

        if !output.status.success() {
            log::debug!(
                "ffprobe exited with {} for {}",
                output.status,
                path.display()
            );
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

impl MediaProber for FfprobeCli {
    fn identify(&self, path: &Path) -> CoreResult<Option<SourceMetadata>> {
        log::debug!("Running ffprobe for source metadata on: {}", path.display());
        Ok(self.run(path)?.and_then(|stdout| parse_probe_output(&stdout)))
    }

    fn measure(&self, path: &Path) -> CoreResult<MeasuredDimensions> {
        log::debug!("Running ffprobe for output dimensions on: {}", path.display());
        let source = self.identify(path)?.ok_or_else(|| {
            CoreError::Probe(format!("ffprobe could not read {}", path.display()))
        })?;
        measured_dimensions(&source).ok_or_else(|| {
            CoreError::Probe(format!("no video dimensions found in {}", path.display()))
        })
    }
}

/// Dimensions of the primary video stream of a probe result.
pub fn measured_dimensions(source: &SourceMetadata) -> Option<MeasuredDimensions> {
    Some(MeasuredDimensions {
        width: source.width?,
        height: source.height?,
        rotation: source.rotation,
    })
}

// --- ffprobe JSON report ---

#[derive(Debug, Default, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

impl ProbeStream {
    fn is(&self, codec_type: &str) -> bool {
        self.codec_type.as_deref() == Some(codec_type)
    }

    /// Clockwise rotation from the legacy `rotate` tag or the display matrix.
    fn rotation(&self) -> Option<u32> {
        if let Some(tag) = self.tags.get("rotate") {
            if let Ok(degrees) = tag.trim().parse::<i64>() {
                return Some(degrees.rem_euclid(360) as u32);
            }
        }
        // Display matrices report counter-clockwise degrees.
        self.side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .map(|degrees| (-degrees.round() as i64).rem_euclid(360) as u32)
    }
}

/// Parses an ffprobe JSON report. Unparsable or stream-less reports yield `None`.
pub fn parse_probe_output(stdout: &[u8]) -> Option<SourceMetadata> {
    let report: ProbeReport = match serde_json::from_slice(stdout) {
        Ok(report) => report,
        Err(e) => {
            log::warn!("Failed to parse ffprobe output: {}", e);
            return None;
        }
    };
    if report.streams.is_empty() {
        return None;
    }

    let video = report.streams.iter().find(|s| s.is("video"));
    let audio = report.streams.iter().find(|s| s.is("audio"));
    let format = report.format.unwrap_or_default();

    let duration = format
        .duration
        .as_deref()
        .or_else(|| video.and_then(|v| v.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());

    Some(SourceMetadata {
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        rotation: video.and_then(ProbeStream::rotation),
        duration,
        video_codec: video.and_then(|v| v.codec_name.clone()),
        audio_codec: audio.and_then(|a| a.codec_name.clone()),
        format_name: format.format_name,
        bit_rate: format.bit_rate.and_then(|b| b.parse::<u64>().ok()),
        streams: report.streams.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOV_REPORT: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264",
             "width": 1920, "height": 1080, "duration": "12.000",
             "tags": {"rotate": "90", "language": "und"}},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                   "duration": "12.345000", "bit_rate": "5000000"}
    }"#;

    #[test]
    fn test_parse_full_report() {
        let meta = parse_probe_output(MOV_REPORT.as_bytes()).unwrap();
        assert_eq!(meta.width, Some(1920));
        assert_eq!(meta.height, Some(1080));
        assert_eq!(meta.rotation, Some(90));
        assert_eq!(meta.duration, Some(12.345));
        assert_eq!(meta.video_codec.as_deref(), Some("h264"));
        assert_eq!(meta.audio_codec.as_deref(), Some("aac"));
        assert_eq!(meta.bit_rate, Some(5_000_000));
        assert_eq!(meta.streams, 2);
    }

    #[test]
    fn test_display_matrix_rotation() {
        let report = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360,
            "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]}]}"#;
        let meta = parse_probe_output(report.as_bytes()).unwrap();
        assert_eq!(meta.rotation, Some(90));
        assert_eq!(meta.duration, None);
    }

    #[test]
    fn test_audio_only_report_has_no_dimensions() {
        let report = r#"{"streams": [{"codec_type": "audio", "codec_name": "mp3"}],
                         "format": {"duration": "3.5"}}"#;
        let meta = parse_probe_output(report.as_bytes()).unwrap();
        assert_eq!(meta.width, None);
        assert_eq!(meta.duration, Some(3.5));
        assert!(measured_dimensions(&meta).is_none());
    }

    #[test]
    fn test_empty_or_garbage_report_is_unsupported() {
        assert!(parse_probe_output(br#"{"streams": [], "format": {}}"#).is_none());
        assert!(parse_probe_output(b"{}").is_none());
        assert!(parse_probe_output(b"not json").is_none());
    }

    #[test]
    fn test_missing_ffprobe_binary_is_an_error() {
        let prober = FfprobeCli::with_program("avstyle-no-such-ffprobe");
        let err = prober.identify(Path::new("clip.mov")).unwrap_err();
        assert!(matches!(err, CoreError::CommandStart(_, _)));
    }
}

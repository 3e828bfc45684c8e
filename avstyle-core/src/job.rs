// ============================================================================
// avstyle-core/src/job.rs
// ============================================================================
//
// JOB BUILDING: From style options to an engine-agnostic transcode job
//
// This module turns a TranscodeOptions value plus the parsed geometry into a
// TranscodeJobSpec. Building is a pure data transformation: no process is
// started here, which keeps the merge rules testable on their own.
//
// MERGE ORDER FOR OUTPUT PARAMETERS:
// 1. Rotation filter, only when the `auto-rotate` feature is enabled
// 2. Caller-supplied `convert_options.output`, in the order written
// 3. Geometry size (`s`), which always wins
//
// Input parameters are tokenized shell-style, so quoted values survive as
// single arguments.

use crate::config::TranscodeOptions;
use crate::geometry::GeometryDirective;
use crate::metadata::SourceMetadata;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output size flag written from the geometry directive.
pub const SIZE_PARAM: &str = "s";

/// Ordered flag -> value pairs with unique flags.
///
/// Inserting an existing flag replaces its value in place. Flags are stored
/// without their leading `-`, so `"-s"` and `"s"` name the same flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputParams {
    entries: Vec<(String, String)>,
}

impl OutputParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: &str, value: impl Into<String>) {
        let flag = normalize_flag(flag);
        let value = value.into();
        match self.entries.iter().position(|(existing, _)| existing == flag) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((flag.to_string(), value)),
        }
    }

    pub fn get(&self, flag: &str) -> Option<&str> {
        let flag = normalize_flag(flag);
        self.entries
            .iter()
            .find(|(existing, _)| existing == flag)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_flag(flag: &str) -> &str {
    flag.trim().trim_start_matches('-')
}

/// A fully specified transcode, ready for an execution backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJobSpec {
    source_path: PathBuf,
    destination_path: PathBuf,
    format: Option<String>,
    input_params: Vec<String>,
    output_params: OutputParams,
    seek_time: Option<Duration>,
    pad_color: Option<String>,
}

impl TranscodeJobSpec {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Raw input arguments, in caller order.
    pub fn input_params(&self) -> &[String] {
        &self.input_params
    }

    pub fn output_params(&self) -> &OutputParams {
        &self.output_params
    }

    /// Set only for still-image outputs.
    pub fn seek_time(&self) -> Option<Duration> {
        self.seek_time
    }

    /// Set only for pad-only directives.
    pub fn pad_color(&self) -> Option<&str> {
        self.pad_color.as_deref()
    }
}

/// Builds the job for one source/destination pair.
pub fn build_job(
    options: &TranscodeOptions,
    geometry: Option<&GeometryDirective>,
    source_path: &Path,
    destination_path: &Path,
    source: &SourceMetadata,
) -> TranscodeJobSpec {
    let convert = options.convert_options.clone().unwrap_or_default();
    let still_image = options.is_still_image();

    let mut output_params = OutputParams::new();
    apply_auto_rotate(options, source, &mut output_params);

    for (flag, value) in &convert.output {
        output_params.insert(flag, value.as_str());
    }

    if let Some(directive) = geometry {
        output_params.insert(SIZE_PARAM, directive.sanitized());
    }

    let input_params = convert.input.iter().flat_map(|flag| split_input_param(flag)).collect();

    let seek_time = still_image.then(|| options.time.resolve(source, options));
    let pad_color = geometry
        .filter(|directive| directive.pad_only())
        .map(|_| options.pad_color.clone());

    TranscodeJobSpec {
        source_path: source_path.to_path_buf(),
        destination_path: destination_path.to_path_buf(),
        format: options.format.clone(),
        input_params,
        output_params,
        seek_time,
        pad_color,
    }
}

/// Splits one input entry into engine arguments, honouring shell quoting.
///
/// Entries `shlex` cannot tokenize (unbalanced quotes) are passed through as a
/// single argument; `TranscodeOptions::validate` rejects them up front.
pub fn split_input_param(entry: &str) -> Vec<String> {
    shlex::split(entry).unwrap_or_else(|| vec![entry.to_string()])
}

#[cfg(feature = "auto-rotate")]
fn apply_auto_rotate(options: &TranscodeOptions, source: &SourceMetadata, params: &mut OutputParams) {
    if !options.auto_rotate {
        return;
    }
    if let Some(filter) = rotation_filter(source.rotation) {
        log::debug!("Applying rotation correction filter '{}'", filter);
        params.insert("vf", filter);
    }
}

#[cfg(not(feature = "auto-rotate"))]
fn apply_auto_rotate(options: &TranscodeOptions, _source: &SourceMetadata, _params: &mut OutputParams) {
    if options.auto_rotate {
        log::debug!("auto_rotate requested but the `auto-rotate` feature is disabled; ignoring");
    }
}

/// Transpose filter undoing a clockwise rotation.
#[cfg(feature = "auto-rotate")]
pub fn rotation_filter(rotation: Option<u32>) -> Option<&'static str> {
    match rotation.map(|r| r % 360) {
        Some(90) => Some("transpose=1"),
        Some(180) => Some("transpose=2,transpose=2"),
        Some(270) => Some("transpose=2"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvertOptions, SeekTime};

    fn source() -> SourceMetadata {
        SourceMetadata {
            width: Some(1280),
            height: Some(720),
            rotation: Some(90),
            duration: Some(20.0),
            streams: 2,
            ..Default::default()
        }
    }

    fn build(options: &TranscodeOptions) -> TranscodeJobSpec {
        let geometry = GeometryDirective::parse(options.geometry.as_deref()).unwrap();
        build_job(
            options,
            geometry.as_ref(),
            Path::new("/in/clip.mov"),
            Path::new("/tmp/clip.mp4"),
            &source(),
        )
    }

    #[test]
    fn test_no_convert_options_and_no_geometry() {
        let job = build(&TranscodeOptions::default());
        assert!(job.output_params().is_empty());
        assert!(job.input_params().is_empty());
        assert_eq!(job.seek_time(), None);
        assert_eq!(job.source_path(), Path::new("/in/clip.mov"));
        assert_eq!(job.destination_path(), Path::new("/tmp/clip.mp4"));
    }

    #[test]
    fn test_geometry_only_adds_size() {
        let options = TranscodeOptions::builder().geometry("320x240#").format("mp4").build();
        let job = build(&options);
        assert_eq!(job.output_params().len(), 1);
        assert_eq!(job.output_params().get("s"), Some("320x240"));
        assert_eq!(job.format(), Some("mp4"));
    }

    #[test]
    fn test_geometry_size_overrides_caller_size() {
        let options = TranscodeOptions::builder()
            .geometry(">640x480")
            .output_param("-s", "1920x1080")
            .output_param("vcodec", "libx264")
            .build();
        let job = build(&options);
        assert_eq!(job.output_params().get("s"), Some("640x480"));
        assert_eq!(job.output_params().get("vcodec"), Some("libx264"));
        assert_eq!(job.output_params().len(), 2);
    }

    #[test]
    fn test_input_params_split_and_keep_order() {
        let options = TranscodeOptions::builder()
            .convert_options(ConvertOptions {
                input: vec!["-hwaccel auto".to_string(), "-re".to_string()],
                ..Default::default()
            })
            .build();
        let job = build(&options);
        assert_eq!(job.input_params(), ["-hwaccel", "auto", "-re"]);
    }

    #[test]
    fn test_quoted_input_value_stays_one_argument() {
        let options = TranscodeOptions::builder()
            .input_param("-metadata 'title=My Clip'")
            .input_param("-f \"lavfi input\"")
            .build();
        let job = build(&options);
        assert_eq!(
            job.input_params(),
            ["-metadata", "title=My Clip", "-f", "lavfi input"]
        );
        assert_eq!(split_input_param("-i 'unbalanced"), vec!["-i 'unbalanced".to_string()]);
    }

    #[test]
    fn test_still_image_resolves_seek_without_extra_params() {
        let options = TranscodeOptions::builder()
            .format("jpg")
            .time(SeekTime::computed(|source, _| {
                Duration::from_secs_f64(source.duration.unwrap_or(0.0) / 4.0)
            }))
            .build();
        let job = build(&options);
        assert_eq!(job.seek_time(), Some(Duration::from_secs(5)));
        assert_eq!(job.output_params().get("frames:v"), None);
        assert!(job.output_params().is_empty());
    }

    #[test]
    fn test_still_image_without_convert_options_only_gets_size() {
        for format in ["jpg", "jpeg", "png", "gif"] {
            let options = TranscodeOptions::builder().geometry("320x240").format(format).build();
            let job = build(&options);
            assert_eq!(
                job.output_params().iter().collect::<Vec<_>>(),
                vec![("s", "320x240")],
                "unexpected output params for {format}"
            );
        }
    }

    #[test]
    fn test_caller_frame_count_is_passed_through() {
        let options = TranscodeOptions::builder()
            .format("gif")
            .output_param("frames:v", "25")
            .build();
        let job = build(&options);
        assert_eq!(job.output_params().get("frames:v"), Some("25"));
    }

    #[test]
    fn test_caller_output_params_keep_written_order() {
        let options = TranscodeOptions::builder()
            .geometry("320x240")
            .output_param("map", "0:v")
            .output_param("vcodec", "libx264")
            .output_param("c:a", "aac")
            .build();
        let job = build(&options);
        assert_eq!(
            job.output_params().iter().collect::<Vec<_>>(),
            vec![("map", "0:v"), ("vcodec", "libx264"), ("c:a", "aac"), ("s", "320x240")]
        );
    }

    #[test]
    fn test_video_output_ignores_seek_time() {
        let options = TranscodeOptions::builder().format("mp4").seek_secs(7.0).build();
        assert_eq!(build(&options).seek_time(), None);
    }

    #[test]
    fn test_pad_color_only_for_pad_only_geometry() {
        let padded = TranscodeOptions::builder().geometry("#!x240").pad_color("white").build();
        assert_eq!(build(&padded).pad_color(), Some("white"));

        let plain = TranscodeOptions::builder().geometry("#320x240").build();
        assert_eq!(build(&plain).pad_color(), None);
    }

    #[cfg(not(feature = "auto-rotate"))]
    #[test]
    fn test_auto_rotate_is_inert_without_feature() {
        let options = TranscodeOptions::builder().auto_rotate(true).build();
        assert_eq!(build(&options).output_params().get("vf"), None);
    }

    #[cfg(feature = "auto-rotate")]
    #[test]
    fn test_auto_rotate_adds_transpose_before_caller_params() {
        let options = TranscodeOptions::builder().auto_rotate(true).build();
        assert_eq!(build(&options).output_params().get("vf"), Some("transpose=1"));

        let overridden = TranscodeOptions::builder()
            .auto_rotate(true)
            .output_param("vf", "hflip")
            .build();
        assert_eq!(build(&overridden).output_params().get("vf"), Some("hflip"));
        assert_eq!(rotation_filter(Some(0)), None);
    }

    #[test]
    fn test_output_params_replace_in_place() {
        let mut params = OutputParams::new();
        params.insert("a", "1");
        params.insert("-b", "2");
        params.insert("a", "3");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }
}

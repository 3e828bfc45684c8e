// ============================================================================
// avstyle-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Per-style transcode options and transcoder settings
//
// KEY COMPONENTS:
// - TranscodeOptions: everything one style asks of the transcoder
// - SeekTime: fixed or computed seek offset for still-image outputs
// - ConvertOptions: raw input flags and output flag/value pairs
// - TranscodeOptionsBuilder: fluent construction with defaults
// - StyleSet: a JSON file of named styles
// - TranscoderConfig: settings that apply to every run
//
// USAGE:
// Options are usually built in code or loaded from a styles file by the CLI,
// validated once, then handed to `Transcoder::run` for a single source file.

// ---- Internal crate imports ----
use crate::error::{CoreResult, config_error};
use crate::geometry::GeometryDirective;
use crate::metadata::SourceMetadata;

// ---- External crate imports ----
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Style name used when none is configured.
pub const DEFAULT_STYLE: &str = "default";

/// Seek offset (seconds) used for still-image outputs when `time` is unset.
pub const DEFAULT_SEEK_SECS: u64 = 3;

/// Pad color used when `pad_color` is unset.
pub const DEFAULT_PAD_COLOR: &str = "black";

/// Attachment field holding the serialized style -> metadata document.
pub const DEFAULT_META_FIELD: &str = "meta";

/// Output formats treated as still images (the source is seeked to `time`).
pub const STILL_IMAGE_FORMATS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// True when `format` names a still-image output.
pub fn is_still_image_format(format: &str) -> bool {
    STILL_IMAGE_FORMATS
        .iter()
        .any(|still| still.eq_ignore_ascii_case(format))
}

// ============================================================================
// SEEK TIME
// ============================================================================

/// Computes a seek offset from the probed source and the style options.
pub type SeekFn = dyn Fn(&SourceMetadata, &TranscodeOptions) -> Duration + Send + Sync;

/// Where to grab the frame for still-image outputs.
///
/// In a styles file this is a number of seconds; computed variants can only
/// be built in code.
#[derive(Clone)]
pub enum SeekTime {
    Fixed(Duration),
    Computed(Arc<SeekFn>),
}

impl SeekTime {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&SourceMetadata, &TranscodeOptions) -> Duration + Send + Sync + 'static,
    {
        SeekTime::Computed(Arc::new(f))
    }

    /// Resolves the offset against the probed source.
    pub fn resolve(&self, source: &SourceMetadata, options: &TranscodeOptions) -> Duration {
        match self {
            SeekTime::Fixed(duration) => *duration,
            SeekTime::Computed(f) => f(source, options),
        }
    }
}

impl Default for SeekTime {
    fn default() -> Self {
        SeekTime::Fixed(Duration::from_secs(DEFAULT_SEEK_SECS))
    }
}

impl fmt::Debug for SeekTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekTime::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            SeekTime::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl Serialize for SeekTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SeekTime::Fixed(duration) => serializer.serialize_f64(duration.as_secs_f64()),
            SeekTime::Computed(_) => Err(ser::Error::custom(
                "a computed seek time cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for SeekTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map(SeekTime::Fixed)
            .map_err(|_| de::Error::custom(format!("invalid seek time {secs}")))
    }
}

// ============================================================================
// CONVERT OPTIONS
// ============================================================================

/// Caller-supplied engine parameters.
///
/// `input` entries are raw flags placed before the source, tokenized with
/// shell quoting (`"-hwaccel auto"` becomes two arguments, `"-metadata
/// 'title=My Clip'"` keeps the quoted value whole). `output` maps a flag name
/// (leading `-` optional) to its value in the order written; an empty value
/// emits the flag alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub input: Vec<String>,
    pub output: IndexMap<String, String>,
}

// ============================================================================
// TRANSCODE OPTIONS
// ============================================================================

/// Options for transcoding one source file into one style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    /// Output container / image format, also the destination extension.
    pub format: Option<String>,

    /// ImageMagick-style geometry, e.g. `"320x240#"`.
    pub geometry: Option<String>,

    pub convert_options: Option<ConvertOptions>,

    /// Seek offset for still-image outputs.
    pub time: SeekTime,

    /// Rotation correction from the probed rotation. Only honoured when the
    /// crate is built with the `auto-rotate` feature.
    pub auto_rotate: bool,

    pub pad_color: String,

    pub style: String,

    /// Propagate engine failures instead of passing the source through.
    pub whiny: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            format: None,
            geometry: None,
            convert_options: None,
            time: SeekTime::default(),
            auto_rotate: false,
            pad_color: DEFAULT_PAD_COLOR.to_string(),
            style: DEFAULT_STYLE.to_string(),
            whiny: true,
        }
    }
}

impl TranscodeOptions {
    pub fn builder() -> TranscodeOptionsBuilder {
        TranscodeOptionsBuilder::new()
    }

    /// Checks the options without touching any file or external tool.
    pub fn validate(&self) -> CoreResult<()> {
        GeometryDirective::parse(self.geometry.as_deref())?;

        if self.pad_color.trim().is_empty() {
            return Err(config_error("pad_color must not be empty"));
        }
        if let Some(convert) = &self.convert_options {
            if let Some(entry) = convert.input.iter().find(|e| shlex::split(e).is_none()) {
                return Err(config_error(format!(
                    "input param '{entry}' has unbalanced quotes"
                )));
            }
        }
        if self.style.trim().is_empty() {
            return Err(config_error("style name must not be empty"));
        }
        if let Some(format) = &self.format {
            if format.is_empty() || format.contains(['/', '\\', '.']) {
                return Err(config_error(format!(
                    "format '{format}' must be a bare extension such as 'mp4'"
                )));
            }
        }
        Ok(())
    }

    /// Whether the configured output is a single still frame.
    pub fn is_still_image(&self) -> bool {
        self.format.as_deref().is_some_and(is_still_image_format)
    }
}

/// Builder for [`TranscodeOptions`].
///
/// # Examples
///
/// ```rust
/// use avstyle_core::config::TranscodeOptions;
///
/// let options = TranscodeOptions::builder()
///     .style("thumb")
///     .geometry("320x240#")
///     .format("jpg")
///     .seek_secs(1.5)
///     .output_param("q:v", "2")
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptionsBuilder {
    options: TranscodeOptions,
}

impl TranscodeOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.options.format = Some(format.into());
        self
    }

    pub fn geometry(mut self, geometry: impl Into<String>) -> Self {
        self.options.geometry = Some(geometry.into());
        self
    }

    /// Appends a raw input flag.
    pub fn input_param(mut self, flag: impl Into<String>) -> Self {
        self.options
            .convert_options
            .get_or_insert_with(ConvertOptions::default)
            .input
            .push(flag.into());
        self
    }

    /// Sets an output flag, replacing any earlier value for the same flag.
    pub fn output_param(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .convert_options
            .get_or_insert_with(ConvertOptions::default)
            .output
            .insert(flag.into(), value.into());
        self
    }

    pub fn convert_options(mut self, convert_options: ConvertOptions) -> Self {
        self.options.convert_options = Some(convert_options);
        self
    }

    pub fn time(mut self, time: SeekTime) -> Self {
        self.options.time = time;
        self
    }

    /// Shorthand for a fixed seek time in seconds. Negative or non-finite
    /// values fall back to zero.
    pub fn seek_secs(self, secs: f64) -> Self {
        let duration = Duration::try_from_secs_f64(secs).unwrap_or_default();
        self.time(SeekTime::Fixed(duration))
    }

    pub fn auto_rotate(mut self, enabled: bool) -> Self {
        self.options.auto_rotate = enabled;
        self
    }

    pub fn pad_color(mut self, color: impl Into<String>) -> Self {
        self.options.pad_color = color.into();
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.options.style = style.into();
        self
    }

    pub fn whiny(mut self, whiny: bool) -> Self {
        self.options.whiny = whiny;
        self
    }

    pub fn build(self) -> TranscodeOptions {
        self.options
    }
}

/// Starts from existing options, e.g. a style loaded from a [`StyleSet`].
impl From<TranscodeOptions> for TranscodeOptionsBuilder {
    fn from(options: TranscodeOptions) -> Self {
        Self { options }
    }
}

// ============================================================================
// STYLE SETS
// ============================================================================

/// Named styles loaded from a JSON file such as:
///
/// ```json
/// {
///   "thumb": { "geometry": "320x240#", "format": "jpg", "time": 1.5 },
///   "web":   { "format": "mp4", "convert_options": { "output": { "vcodec": "libx264" } } }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StyleSet {
    styles: BTreeMap<String, TranscodeOptions>,
}

impl StyleSet {
    /// Reads and validates a styles file. Each entry's `style` is its key.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let set = Self::from_json(&text)?;
        log::debug!(
            "Loaded {} style(s) from {}",
            set.styles.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn from_json(text: &str) -> CoreResult<Self> {
        let mut styles: BTreeMap<String, TranscodeOptions> = serde_json::from_str(text)?;
        for (name, options) in styles.iter_mut() {
            options.style = name.clone();
            options
                .validate()
                .map_err(|e| config_error(format!("style '{name}': {e}")))?;
        }
        Ok(Self { styles })
    }

    pub fn get(&self, style: &str) -> Option<&TranscodeOptions> {
        self.styles.get(style)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}

// ============================================================================
// TRANSCODER CONFIGURATION
// ============================================================================

/// Settings shared by every run of a transcoder.
#[derive(Debug, Clone, Default)]
pub struct TranscoderConfig {
    /// Directory for destination temp files; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

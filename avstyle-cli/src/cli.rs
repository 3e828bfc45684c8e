// avstyle-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "avstyle: transcode uploads into named styles",
    long_about = "Transcodes a single media file into a named style using ffmpeg via avstyle-core, \
                  recording probed source and output metadata per style."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: Directory for a timestamped log file
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcodes one file into one style
    Transcode(TranscodeArgs),
    /// Prints the probe result and stored style metadata for a file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Source file
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Where the result is written
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_PATH")]
    pub output_path: PathBuf,

    /// Geometry such as 320x240, 320x240# (pad), 640x480< (enlarge only)
    #[arg(short, long, value_name = "GEOMETRY")]
    pub geometry: Option<String>,

    /// Output format / extension, e.g. mp4 or jpg
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Style name the metadata is recorded under (selects the style when --styles is given)
    #[arg(short, long, value_name = "STYLE")]
    pub style: Option<String>,

    /// JSON file of named styles
    #[arg(long, value_name = "FILE", env = "AVSTYLE_STYLES")]
    pub styles: Option<PathBuf>,

    /// Seek offset in seconds for still-image outputs
    #[arg(short, long, value_name = "SECONDS")]
    pub time: Option<f64>,

    /// Raw ffmpeg input flag(s) placed before the source, e.g. "-hwaccel auto"
    #[arg(long = "input-param", value_name = "FLAG", allow_hyphen_values = true)]
    pub input_params: Vec<String>,

    /// ffmpeg output flag as KEY=VALUE, e.g. vcodec=libx264 (repeatable)
    #[arg(long = "output-param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub output_params: Vec<(String, String)>,

    /// Pad color for padded geometries
    #[arg(long, value_name = "COLOR")]
    pub pad_color: Option<String>,

    /// Return the original file instead of failing when ffmpeg fails
    #[arg(long, default_value_t = false)]
    pub no_whiny: bool,

    /// JSON file holding the attachment's metadata fields
    #[arg(long, value_name = "FILE")]
    pub meta: Option<PathBuf>,

    /// Field inside the metadata file holding the style document
    #[arg(long, value_name = "NAME", default_value = avstyle_core::config::DEFAULT_META_FIELD)]
    pub meta_field: String,

    /// Directory for intermediate files (defaults to the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Suppress transcoder progress lines
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File to probe
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// JSON file holding the attachment's metadata fields
    #[arg(long, value_name = "FILE")]
    pub meta: Option<PathBuf>,

    /// Field inside the metadata file holding the style document
    #[arg(long, value_name = "NAME", default_value = avstyle_core::config::DEFAULT_META_FIELD)]
    pub meta_field: String,
}

/// Parses `KEY=VALUE`; the value may be empty (`an=` emits `-an` alone).
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, found '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcode_args() {
        let cli = Cli::parse_from([
            "avstyle",
            "--verbose",
            "transcode",
            "-i",
            "clip.mov",
            "-o",
            "clip-thumb.jpg",
            "--geometry",
            "320x240#",
            "--format",
            "jpg",
            "--output-param",
            "q:v=2",
            "--output-param",
            "an=",
            "--input-param",
            "-hwaccel auto",
            "--no-whiny",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Transcode(args) => {
                assert_eq!(args.input_path, PathBuf::from("clip.mov"));
                assert_eq!(args.geometry.as_deref(), Some("320x240#"));
                assert_eq!(
                    args.output_params,
                    vec![
                        ("q:v".to_string(), "2".to_string()),
                        ("an".to_string(), String::new())
                    ]
                );
                assert_eq!(args.input_params, vec!["-hwaccel auto".to_string()]);
                assert!(args.no_whiny);
                assert_eq!(args.meta_field, "meta");
            }
            other => panic!("Expected Transcode command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("vcodec=libx264").unwrap(),
            ("vcodec".to_string(), "libx264".to_string())
        );
        assert!(parse_key_val("vcodec").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}

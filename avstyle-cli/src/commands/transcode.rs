//! Implementation of the 'transcode' subcommand.
//!
//! Resolves the style options (styles file plus flag overrides), validates
//! them before touching the input, runs one transcode through avstyle-core
//! and persists the result to the requested output path.

use crate::cli::TranscodeArgs;
use crate::error::{CliErrorContext, CliResult};

use avstyle_core::config::{DEFAULT_STYLE, TranscodeOptionsBuilder};
use avstyle_core::error::config_error;
use avstyle_core::external::check_dependencies;
use avstyle_core::logging::silent_sink;
use avstyle_core::{
    Attachment, JsonFileMetadataStore, StyleSet, TranscodeOptions, TranscodeOutput, Transcoder,
    TranscoderConfig,
};

use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Builds the options for this run from the styles file and the flags.
///
/// Flags override the selected style; without `--styles`, the flags alone
/// describe the style.
pub fn build_options(args: &TranscodeArgs) -> CliResult<TranscodeOptions> {
    let mut builder = match &args.styles {
        Some(path) => {
            let set = StyleSet::load(path)?;
            let name = args.style.as_deref().unwrap_or(DEFAULT_STYLE);
            let selected = set.get(name).cloned().ok_or_else(|| {
                config_error(format!(
                    "Unknown style '{}' in {} (available: {})",
                    name,
                    path.display(),
                    set.names().collect::<Vec<_>>().join(", ")
                ))
            })?;
            TranscodeOptionsBuilder::from(selected)
        }
        None => {
            let mut builder = TranscodeOptions::builder();
            if let Some(style) = &args.style {
                builder = builder.style(style);
            }
            builder
        }
    };

    if let Some(geometry) = &args.geometry {
        builder = builder.geometry(geometry);
    }
    if let Some(format) = &args.format {
        builder = builder.format(format);
    }
    if let Some(secs) = args.time {
        builder = builder.seek_secs(secs);
    }
    if let Some(color) = &args.pad_color {
        builder = builder.pad_color(color);
    }
    for flag in &args.input_params {
        builder = builder.input_param(flag);
    }
    for (key, value) in &args.output_params {
        builder = builder.output_param(key, value);
    }
    if args.no_whiny {
        builder = builder.whiny(false);
    }

    let options = builder.build();
    options.validate()?;
    Ok(options)
}

pub fn run_transcode(args: TranscodeArgs) -> CliResult<()> {
    let start_time = Instant::now();
    let options = build_options(&args)?;

    let input_path = args
        .input_path
        .canonicalize()
        .cli_with_context(|| format!("Invalid input path '{}'", args.input_path.display()))?;
    if !input_path.is_file() {
        return Err(avstyle_core::CoreError::PathError(format!(
            "Input path '{}' is not a file",
            input_path.display()
        )));
    }

    check_dependencies()?;

    info!("Input: {}", input_path.display());
    info!("Style: {}", options.style);
    debug!("Options: {:?}", options);

    let mut transcoder = Transcoder::with_defaults().with_config(TranscoderConfig {
        temp_dir: args.temp_dir.clone(),
    });
    if args.quiet {
        transcoder = transcoder.with_log_sink(silent_sink());
    }

    let output = match &args.meta {
        Some(meta_path) => {
            let mut store = JsonFileMetadataStore::new(meta_path);
            let mut attachment = Attachment::with_field(&mut store, args.meta_field.as_str());
            transcoder.run(&input_path, &options, Some(&mut attachment))?
        }
        None => transcoder.run(&input_path, &options, None)?,
    };

    let summary = match &output {
        TranscodeOutput::Transcoded { record, .. } => match &record.output {
            Some(dims) => format!("transcoded ({}x{})", dims.width, dims.height),
            None => "transcoded".to_string(),
        },
        TranscodeOutput::Copied(_) => "copied unchanged (not a supported media file)".to_string(),
        TranscodeOutput::Source(_) => {
            warn!("ffmpeg failed; writing the original file instead");
            "original file (transcode failed)".to_string()
        }
    };

    let output_path: PathBuf = args.output_path;
    output.persist(&output_path)?;

    info!(
        "{} -> {}: {} in {:.2}s",
        input_path.display(),
        output_path.display(),
        summary,
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

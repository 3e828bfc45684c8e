//! Implementation of the 'inspect' subcommand.
//!
//! Probes a file and prints a JSON report of the probe result and, when a
//! metadata file is given, the stored style document.

use crate::cli::InspectArgs;
use crate::error::{CliErrorContext, CliResult};

use avstyle_core::external::{FfprobeCli, MediaProber};
use avstyle_core::{Attachment, JsonFileMetadataStore, MetadataDocument};

use serde_json::{Value, json};

/// Assembles the report printed by `inspect`.
pub fn inspect_report(
    input: &str,
    probe: Option<&avstyle_core::SourceMetadata>,
    styles: Option<&MetadataDocument>,
) -> CliResult<Value> {
    let mut report = json!({
        "input": input,
        "supported": probe.is_some(),
    });
    if let Some(source) = probe {
        report["source"] = serde_json::to_value(source)?;
    }
    if let Some(document) = styles {
        report["styles"] = document.as_value();
    }
    Ok(report)
}

pub fn run_inspect(args: InspectArgs) -> CliResult<()> {
    let input_path = args
        .input_path
        .canonicalize()
        .cli_with_context(|| format!("Invalid input path '{}'", args.input_path.display()))?;

    let probe = FfprobeCli::new()
        .identify(&input_path)?
        .filter(|source| !source.is_empty());
    log::debug!("Probe result for {}: {:?}", input_path.display(), probe);

    let document = match &args.meta {
        Some(meta_path) => {
            let mut store = JsonFileMetadataStore::new(meta_path);
            let attachment = Attachment::with_field(&mut store, args.meta_field.as_str());
            Some(attachment.meta()?)
        }
        None => None,
    };

    let report = inspect_report(
        &input_path.to_string_lossy(),
        probe.as_ref(),
        document.as_ref(),
    )?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

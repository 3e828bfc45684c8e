// ============================================================================
// avstyle-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: avstyle command-line application
//
// Parses arguments, installs logging, dispatches to the subcommand and maps
// the outcome to the process exit code:
// - 0: success (including pass-through copies and non-whiny fallbacks)
// - 1: any error reported by a command
// - 2: argument parsing errors (reported by clap before we get here)

use avstyle_cli::logging::init_logging;
use avstyle_cli::{Cli, Commands, run_inspect, run_transcode};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    match init_logging(cli.verbose, cli.log_dir.as_deref()) {
        Ok(Some(log_path)) => log::debug!("Log file: {}", log_path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Transcode(args) => run_transcode(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    if let Err(e) = result {
        log::error!("Error: {e}");
        process::exit(1);
    }
}

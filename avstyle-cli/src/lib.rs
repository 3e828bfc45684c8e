// avstyle-cli/src/lib.rs
//
// Library portion of the avstyle CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, InspectArgs, TranscodeArgs};
pub use commands::inspect::run_inspect;
pub use commands::transcode::run_transcode;

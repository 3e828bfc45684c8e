//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `transcode` command.
/// Runs one source file through one style and writes the result.
pub mod transcode;

/// Module containing the implementation of the `inspect` command.
pub mod inspect;

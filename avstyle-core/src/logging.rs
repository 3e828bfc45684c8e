//! Logging helpers shared by the transcoder and the external tool wrappers.
//!
//! Library code logs through the `log` facade. The transcoder additionally
//! reports its progress through an injected [`LogSink`], so embedding
//! applications can route those lines wherever they like.

use std::process::Command;

/// Receives one human-readable progress line per call.
pub type LogSink = Box<dyn Fn(&str) + Send + Sync>;

/// Prefix applied by the default sink.
pub const TRANSCODER_LOG_PREFIX: &str = "[transcoder]";

/// The default sink: forwards to `log::info!` with the transcoder prefix.
pub fn default_sink() -> LogSink {
    Box::new(|message: &str| log::info!("{} {}", TRANSCODER_LOG_PREFIX, message))
}

/// A sink that drops everything.
pub fn silent_sink() -> LogSink {
    Box::new(|_: &str| {})
}

/// Log a command being executed
pub fn log_command(cmd: &Command) {
    log::debug!("Executing command: {}", format_command(cmd));
}

/// Renders a command as a single shell-like line.
pub fn format_command(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let args: Vec<_> = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

// ============================================================================
// avstyle-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses avstyle-core's error type; this module adds the alias and a
// small context helper for wrapping filesystem errors with the offending path.

// ---- Internal crate imports ----
use avstyle_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Extension trait for attaching a message to a failed filesystem operation.
pub trait CliErrorContext<T> {
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| CoreError::PathError(format!("{}: {}", f(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_cli_with_context_wraps_message() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result
            .cli_with_context(|| "Invalid input path 'clip.mov'")
            .unwrap_err();
        assert_eq!(err.to_string(), "Path error: Invalid input path 'clip.mov': gone");
    }
}

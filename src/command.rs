use crate::env::Environment;
use anyhow::Result;
use std::io::{Read, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code of a stage whose command name is not in the builtin table.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Exit code for malformed arguments and malformed lines.
pub const EXIT_USAGE: ExitCode = 2;

/// Object-safe trait for any command that can be executed by the shell.
///
/// Implemented by every builtin through a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// Diagnostics go to `stderr` as complete lines. An `Err` is reserved for
    /// failures of the streams themselves.
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[String],
    ) -> Option<Box<dyn ExecutableCommand>>;
}

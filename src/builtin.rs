use crate::command::{CommandFactory, EXIT_USAGE, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::messages::Messages;
use anyhow::{Context, Result};
use regex::bytes::{Regex, RegexBuilder};
use std::fs;
use std::io::{self, Read, Write};
use std::ops::AddAssign;

/// Built-in commands known to the shell at compile time.
///
/// Builtins parse their own arguments and run in-process against the streams
/// of their pipeline stage.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "grep".
    fn name() -> &'static str;

    /// Parses the arguments that follow the command name.
    ///
    /// On failure returns the diagnostic line to print instead of running.
    fn from_args(args: &[String], messages: &Messages) -> Result<Self, String>;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, stdin, stdout, stderr, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stderr, "{}: {:#}", T::name(), e)?;
                Ok(1)
            }
        }
    }
}

/// Stands in for a builtin whose arguments were rejected.
struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _env: &Environment,
    ) -> Result<ExitCode> {
        writeln!(stderr, "{}", self.output)?;
        Ok(EXIT_USAGE)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[String],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(args, env.messages()) {
                Ok(cmd) => Box::new(cmd),
                Err(output) => Box::new(InvalidArgs { output }),
            })
        } else {
            None
        }
    }
}

/// Reads a named file in full, resolving it against the session directory.
///
/// The handle is closed before this returns, on every path.
fn read_file(env: &Environment, name: &str) -> io::Result<Vec<u8>> {
    fs::read(env.resolve(name))
}

fn report_unreadable(
    stderr: &mut dyn Write,
    env: &Environment,
    cmd: &str,
    name: &str,
    err: io::Error,
) -> Result<()> {
    tracing::debug!(cmd, file = name, error = %err, "cannot read file");
    writeln!(stderr, "{}", env.messages().no_such_file(cmd, name))?;
    Ok(())
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn from_args(_args: &[String], _messages: &Messages) -> Result<Self, String> {
        Ok(Pwd)
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir().to_string_lossy())?;
        Ok(0)
    }
}

/// Write the arguments to standard output, separated by single spaces and
/// followed by a newline.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn from_args(args: &[String], _messages: &Messages) -> Result<Self, String> {
        Ok(Echo {
            args: args.to_vec(),
        })
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

/// Print file(s) to stdout byte for byte; standard input when no file is named.
pub struct Cat {
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn from_args(args: &[String], _messages: &Messages) -> Result<Self, String> {
        Ok(Cat {
            files: args.to_vec(),
        })
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode> {
        if self.files.is_empty() {
            io::copy(stdin, stdout).context("copying standard input")?;
            return Ok(0);
        }

        let mut exit_code = 0;
        for fname in &self.files {
            match read_file(env, fname) {
                Ok(data) => stdout.write_all(&data)?,
                Err(e) => {
                    report_unreadable(stderr, env, Self::name(), fname, e)?;
                    exit_code = 1;
                }
            }
        }
        Ok(exit_code)
    }
}

/// Whitespace as C `isspace` sees it, vertical tab included.
fn is_word_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'\x0b'
}

/// Line, word and byte counts of one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

impl Counts {
    fn of(data: &[u8]) -> Self {
        Counts {
            lines: data.iter().filter(|&&b| b == b'\n').count(),
            words: data
                .split(|&b| is_word_separator(b))
                .filter(|w| !w.is_empty())
                .count(),
            bytes: data.len(),
        }
    }

    fn write(&self, stdout: &mut dyn Write, label: Option<&str>) -> io::Result<()> {
        write!(stdout, " {}\t{}\t{}", self.lines, self.words, self.bytes)?;
        match label {
            Some(label) => writeln!(stdout, " {}", label),
            None => writeln!(stdout),
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
    }
}

/// Count lines, words and bytes.
pub struct Wc {
    pub files: Vec<String>,
}

impl BuiltinCommand for Wc {
    fn name() -> &'static str {
        "wc"
    }

    fn from_args(args: &[String], _messages: &Messages) -> Result<Self, String> {
        Ok(Wc {
            files: args.to_vec(),
        })
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode> {
        if self.files.is_empty() {
            let mut buf = Vec::new();
            stdin
                .read_to_end(&mut buf)
                .context("reading standard input")?;
            Counts::of(&buf).write(stdout, None)?;
            return Ok(0);
        }

        let mut total = Counts::default();
        let mut counted = 0;
        let mut exit_code = 0;
        for fname in &self.files {
            match read_file(env, fname) {
                Ok(data) => {
                    let counts = Counts::of(&data);
                    counts.write(stdout, Some(fname.as_str()))?;
                    total += counts;
                    counted += 1;
                }
                Err(e) => {
                    report_unreadable(stderr, env, Self::name(), fname, e)?;
                    exit_code = 1;
                }
            }
        }

        if counted > 1 {
            total.write(stdout, Some(env.messages().total()))?;
        }
        Ok(exit_code)
    }
}

/// Flags accepted by `grep`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrepOptions {
    /// `-i`
    pub ignore_case: bool,
    /// `-w`
    pub word_regexp: bool,
    /// `-A n`
    pub after_context: usize,
}

/// Print lines containing a literal pattern.
#[derive(Debug, PartialEq, Eq)]
pub struct Grep {
    pub options: GrepOptions,
    pub pattern: String,
    /// Files to search. If none provided, reads from stdin.
    pub files: Vec<String>,
}

/// Accepts only plain decimal digits, so `-A +2` and `-A -1` are rejected.
fn parse_context(count: &str) -> Option<usize> {
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    count.parse().ok()
}

impl Grep {
    fn matcher(&self) -> Result<Regex> {
        let literal = regex::escape(&self.pattern);
        let expr = if self.options.word_regexp {
            format!(r"(?:^|\W)(?:{})(?:\W|$)", literal)
        } else {
            literal
        };

        RegexBuilder::new(&expr)
            .case_insensitive(self.options.ignore_case)
            .build()
            .with_context(|| format!("invalid pattern: {}", self.pattern))
    }

    /// Emits each matching line followed by up to `after_context` lines.
    ///
    /// Context lines are not matched again, so no line is printed twice.
    fn process_source(
        &self,
        data: &[u8],
        stdout: &mut dyn Write,
        file_name: Option<&str>,
        re: &Regex,
    ) -> io::Result<()> {
        let lines: Vec<&[u8]> = data.split_inclusive(|&b| b == b'\n').collect();

        let mut i = 0;
        while i < lines.len() {
            let content = lines[i].strip_suffix(b"\n").unwrap_or(lines[i]);
            if !re.is_match(content) {
                i += 1;
                continue;
            }

            let end = i
                .saturating_add(1)
                .saturating_add(self.options.after_context)
                .min(lines.len());
            for line in &lines[i..end] {
                if let Some(name) = file_name {
                    write!(stdout, "{}:", name)?;
                }
                stdout.write_all(line)?;
                if !line.ends_with(b"\n") {
                    stdout.write_all(b"\n")?;
                }
            }
            i = end;
        }
        Ok(())
    }
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    /// Parses `[-i] [-w] [-A n] pattern [file...]`.
    ///
    /// Flags may be clustered (`-wi`, `-wA2`); the count may be glued to `-A` or
    /// be the next argument. `--` ends the options.
    fn from_args(args: &[String], messages: &Messages) -> Result<Self, String> {
        let mut options = GrepOptions::default();
        let mut pattern = None;
        let mut rest = args.iter();

        while let Some(arg) = rest.next() {
            if arg == "--" {
                pattern = rest.next().cloned();
                break;
            }
            let Some(flags) = arg.strip_prefix('-').filter(|f| !f.is_empty()) else {
                pattern = Some(arg.clone());
                break;
            };

            for (i, c) in flags.char_indices() {
                match c {
                    'i' => options.ignore_case = true,
                    'w' => options.word_regexp = true,
                    'A' => {
                        let glued = &flags[i + c.len_utf8()..];
                        let count = if glued.is_empty() {
                            rest.next().map(String::as_str)
                        } else {
                            Some(glued)
                        };
                        options.after_context = count
                            .and_then(parse_context)
                            .ok_or_else(|| messages.bad_context(Self::name()))?;
                        break;
                    }
                    other => {
                        return Err(messages.invalid_option(Self::name(), &format!("-{}", other)));
                    }
                }
            }
        }

        let pattern = pattern.ok_or_else(|| messages.missing_pattern(Self::name()))?;
        Ok(Grep {
            options,
            pattern,
            files: rest.cloned().collect(),
        })
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &Environment,
    ) -> Result<ExitCode> {
        let re = self.matcher()?;

        if self.files.is_empty() {
            let mut buf = Vec::new();
            stdin
                .read_to_end(&mut buf)
                .context("reading standard input")?;
            self.process_source(&buf, stdout, None, &re)?;
            return Ok(0);
        }

        let show_names = self.files.len() > 1;
        let mut final_exit_code = 0;
        for file_name in &self.files {
            match read_file(env, file_name) {
                Ok(data) => {
                    let prefix = show_names.then_some(file_name.as_str());
                    self.process_source(&data, stdout, prefix, &re)?;
                }
                Err(e) => {
                    report_unreadable(stderr, env, Self::name(), file_name, e)?;
                    final_exit_code = 1;
                }
            }
        }
        Ok(final_exit_code)
    }
}

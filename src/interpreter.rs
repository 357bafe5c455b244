use crate::command::{CommandFactory, EXIT_NOT_FOUND, EXIT_USAGE, ExitCode};
use crate::env::Environment;
use crate::lexer::{self, LexingError};
use crate::parser::{self, ParsingError, Pipeline, Stage};
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::borrow::Cow;
use std::io::{self, BufRead, Read, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A line-oriented interpreter for pipelines of builtin commands.
///
/// The interpreter owns the session [`Environment`] (variable bindings survive from
/// one line to the next) and a fixed table of [`CommandFactory`] objects queried
/// by command name. See [`Default`] for the builtins included out of the box.
///
/// Example
/// ```
/// use terminal::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let mut err = Vec::new();
/// sh.run("x=15\necho $x | wc\n".as_bytes(), &mut out, &mut err).unwrap();
/// assert_eq!(out, b" 1\t1\t3\n");
/// assert!(err.is_empty());
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    /// Create an interpreter with the default builtins over the given session.
    pub fn with_env(env: Environment) -> Self {
        use crate::builtin::*;
        Self::new(
            env,
            vec![
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<Cat>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Wc>::default()),
                Box::new(Factory::<Grep>::default()),
            ],
        )
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Execute lines from `input` until it is exhausted.
    ///
    /// Errors on a line are reported to `stderr` and never stop the loop; only a
    /// failure to read `input` or to write the session streams is returned.
    ///
    /// Lines are split on `\n` with an optional `\r` before it. Bytes that are not
    /// valid UTF-8 are replaced with U+FFFD and the line still runs.
    pub fn run<R: BufRead>(
        &mut self,
        mut input: R,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .context("reading command line")?;
            if read == 0 {
                break;
            }

            let bytes = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
            let line = String::from_utf8_lossy(bytes);
            if matches!(line, Cow::Owned(_)) {
                tracing::debug!("replaced invalid UTF-8 in command line");
            }
            self.execute_line(&line, stdout, stderr)?;
        }
        Ok(())
    }

    /// Interactive read-eval-print loop over the process terminal.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    self.execute_line(&line, &mut io::stdout(), &mut io::stderr())?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    /// Tokenize, substitute, build and run one command line.
    ///
    /// Returns the exit code of the last stage that ran. A line that fails to lex
    /// or to split into stages runs nothing.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode> {
        let tokens = match lexer::split_into_tokens(line) {
            Ok(tokens) => tokens,
            Err(LexingError::UnfinishedQuote) => {
                tracing::debug!(line, "unmatched quote");
                writeln!(stderr, "{}", self.env.messages().unmatched_quote())?;
                return Ok(EXIT_USAGE);
            }
        };
        tracing::debug!(?tokens, "lexed");

        let pipeline = match parser::construct_pipeline(&tokens, &mut self.env) {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => return Ok(0),
            Err(ParsingError::EmptyStage) => {
                tracing::debug!(line, "empty pipeline stage");
                writeln!(stderr, "{}", self.env.messages().empty_stage())?;
                return Ok(EXIT_USAGE);
            }
        };
        tracing::debug!(stages = ?pipeline.stages(), "pipeline");

        self.execute_pipeline(&pipeline, stdout, stderr)
    }

    /// Runs the stages left to right, each to completion.
    ///
    /// A stage reads exactly the bytes its predecessor wrote; the first stage reads
    /// nothing. Errors of every stage go straight to `stderr`.
    fn execute_pipeline(
        &self,
        pipeline: &Pipeline,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode> {
        let mut previous_output: Vec<u8> = Vec::new();
        let mut last_exit: ExitCode = 0;

        for stage in pipeline.stages() {
            let mut output = Vec::new();
            last_exit = self.dispatch(stage, &mut previous_output.as_slice(), &mut output, stderr)?;
            previous_output = output;
        }

        stdout.write_all(&previous_output)?;
        stdout.flush()?;
        stderr.flush()?;
        Ok(last_exit)
    }

    /// Look a stage up in the builtin table and run it.
    pub fn dispatch(
        &self,
        stage: &Stage,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, &stage.name, &stage.args) {
                tracing::trace!(name = %stage.name, args = ?stage.args, "dispatch");
                return cmd.execute(stdin, stdout, stderr, &self.env);
            }
        }

        // `x= 15` reaches here as the word `x=`; it is reported under its name
        let name = stage
            .name
            .strip_suffix('=')
            .filter(|name| lexer::is_identifier(name))
            .unwrap_or(stage.name.as_str());
        writeln!(stderr, "{}", self.env.messages().command_not_found(name))?;
        Ok(EXIT_NOT_FOUND)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// `echo`, `cat`, `pwd`, `wc` and `grep`, rooted at the process working directory.
    fn default() -> Self {
        Self::with_env(Environment::new())
    }
}

//! A tiny line-oriented command interpreter.
//!
//! Each input line is split into words with shell-like quoting, `$name` references
//! are substituted from the session's variables, the words are grouped into a
//! pipeline on `|`, and every stage runs an in-process builtin (`echo`, `cat`,
//! `pwd`, `wc`, `grep`) against in-memory streams. No child processes are spawned.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`] and
//! [`env`] expose the traits and session state for embedding or adding commands;
//! [`messages`] holds the localized diagnostics.

mod builtin;
pub mod command;
pub mod env;
mod interpreter;
pub mod lexer;
pub mod messages;
pub mod parser;
pub mod substitution;

/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

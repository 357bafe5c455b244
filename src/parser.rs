//! Pipeline construction from a lexed line.

use crate::env::Environment;
use crate::lexer::Token;
use crate::substitution::substitute;
use thiserror::Error;

/// One command invocation within a pipeline, with every word already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub args: Vec<String>,
}

/// A non-empty sequence of stages connected by `|`.
///
/// Stage `i`'s standard output becomes stage `i + 1`'s standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Errors that can occur while splitting a line into stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    /// A stage between pipes has no command, e.g. `| cmd`, `cmd |` or `x=1 | cmd`.
    #[error("empty pipeline stage")]
    EmptyStage,
}

struct PipelineBuilder<'a> {
    env: &'a mut Environment,
}

impl PipelineBuilder<'_> {
    /// Validates the shape of the line before any binding is installed, so a
    /// malformed line changes nothing.
    fn check_structure(groups: &[&[Token]]) -> Result<(), ParsingError> {
        for group in groups {
            if group.is_empty() {
                return Err(ParsingError::EmptyStage);
            }
            let only_assignments = group
                .iter()
                .all(|t| matches!(t, Token::Assignment { .. }));
            if only_assignments && groups.len() > 1 {
                return Err(ParsingError::EmptyStage);
            }
        }
        Ok(())
    }

    /// Absorb the leading assignments of a stage and substitute its words.
    ///
    /// Each assignment sees the bindings made before it, including those made
    /// earlier on the same line.
    fn parse_stage(&mut self, group: &[Token]) -> Option<Stage> {
        let mut words = Vec::with_capacity(group.len());
        for token in group {
            match token {
                Token::Assignment { name, value } => {
                    let value = substitute(value, self.env);
                    tracing::trace!(%name, %value, "assign");
                    self.env.assign(name.clone(), value);
                }
                Token::Word(parts) => words.push(substitute(parts, self.env)),
                // groups are split on pipes
                Token::PipeOp => {}
            }
        }

        let mut words = words.into_iter();
        let name = words.next()?;
        Some(Stage {
            name,
            args: words.collect(),
        })
    }

    fn build(mut self, tokens: &[Token]) -> Result<Option<Pipeline>, ParsingError> {
        if tokens.is_empty() {
            return Ok(None);
        }

        let groups: Vec<&[Token]> = tokens
            .split(|t| matches!(t, Token::PipeOp))
            .collect();
        Self::check_structure(&groups)?;

        let stages: Vec<Stage> = groups
            .into_iter()
            .filter_map(|group| self.parse_stage(group))
            .collect();

        if stages.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Pipeline { stages }))
        }
    }
}

/// Builds the pipeline for one lexed line, installing its assignments into `env`.
///
/// Returns `Ok(None)` when there is nothing to dispatch: a blank line or a line
/// made only of assignments.
pub fn construct_pipeline(
    tokens: &[Token],
    env: &mut Environment,
) -> Result<Option<Pipeline>, ParsingError> {
    PipelineBuilder { env }.build(tokens)
}

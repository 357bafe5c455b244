//! `$name` substitution over the parts of a lexed word.

use crate::env::Environment;
use crate::lexer::{WordPart, is_identifier_char, is_identifier_start};

/// Concatenates the parts of a word, substituting variables where quoting allows.
pub fn substitute(parts: &[WordPart], env: &Environment) -> String {
    let mut result = String::new();
    for part in parts {
        match part {
            WordPart::SingleQuoted(text) => result.push_str(text),
            WordPart::Unquoted(text) | WordPart::DoubleQuoted(text) => {
                expand_into(&mut result, text, env)
            }
        }
    }
    result
}

/// Appends `text` to `out`, replacing each `$name` by its binding.
///
/// The name is the longest identifier after `$`. A `$` that does not start an
/// identifier is copied as is.
fn expand_into(out: &mut String, text: &str, env: &Environment) {
    let mut rest = text;
    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        match after.chars().next() {
            Some(c) if is_identifier_start(c) => {
                let len = after
                    .find(|c: char| !is_identifier_char(c))
                    .unwrap_or(after.len());
                out.push_str(env.lookup(&after[..len]));
                rest = &after[len..];
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        let mut env = Environment::with_dir(".");
        env.assign("x", "15");
        env.assign("t", "a b");
        env
    }

    #[test]
    fn test_single_quoted_is_untouched() {
        let parts = vec![WordPart::SingleQuoted("$x".to_string())];
        assert_eq!(substitute(&parts, &env()), "$x");
    }

    #[test]
    fn test_unquoted_and_double_quoted_expand() {
        let env = env();
        assert_eq!(substitute(&[WordPart::Unquoted("$x".to_string())], &env), "15");
        assert_eq!(
            substitute(&[WordPart::DoubleQuoted("<$t>".to_string())], &env),
            "<a b>"
        );
    }

    #[test]
    fn test_name_is_maximal() {
        let env = env();
        // `$xy` names `xy`, which is unbound
        assert_eq!(substitute(&[WordPart::Unquoted("$xy".to_string())], &env), "");
        assert_eq!(
            substitute(&[WordPart::Unquoted("$x-$x.".to_string())], &env),
            "15-15."
        );
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        let env = env();
        assert_eq!(substitute(&[WordPart::Unquoted("$".to_string())], &env), "$");
        assert_eq!(substitute(&[WordPart::Unquoted("a$ b".to_string())], &env), "a$ b");
        assert_eq!(substitute(&[WordPart::DoubleQuoted("$1".to_string())], &env), "$1");
        assert_eq!(substitute(&[WordPart::Unquoted("$$x".to_string())], &env), "$15");
    }

    #[test]
    fn test_parts_concatenate() {
        let parts = vec![
            WordPart::Unquoted("v=".to_string()),
            WordPart::DoubleQuoted("$x".to_string()),
            WordPart::SingleQuoted("$x".to_string()),
        ];
        assert_eq!(substitute(&parts, &env()), "v=15$x");
    }
}

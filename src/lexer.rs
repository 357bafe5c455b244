//! Lexical analysis (tokenization) of a single command line.

use thiserror::Error;

/// A run of characters inside a word, tagged with how it was quoted.
///
/// The quoting kind decides what the substitution pass may do with the text:
/// single-quoted text is final, the other two kinds may contain `$name` references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Text outside any quotes.
    Unquoted(String),
    /// Text between `'...'`, without the delimiting quotes.
    SingleQuoted(String),
    /// Text between `"..."`, without the delimiting quotes.
    DoubleQuoted(String),
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word made of adjacent parts with no whitespace between them.
    Word(Vec<WordPart>),
    /// A `name=value` word at the start of a pipeline stage.
    Assignment { name: String, value: Vec<WordPart> },
    /// The pipe operator, `|`.
    PipeOp,
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unmatched quote")]
    UnfinishedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    current_word: Vec<WordPart>,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            current_word: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole line.
    ///
    /// Quote characters switch state without ever being copied into the output, so a
    /// word like `a"b c"'d'` comes out as one `Token::Word` of three parts.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::Start | LexingState::ReadingWord => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {}
            '|' => out.push(Token::PipeOp),
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '|' => {
                self.finish_word(out);
                out.push(Token::PipeOp);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.flush_unquoted();
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.flush_unquoted();
                self.state = LexingState::ReadingDoubleQuote;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => {
                self.current_word
                    .push(WordPart::SingleQuoted(std::mem::take(&mut self.buffer)));
                self.state = LexingState::ReadingWord;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => {
                self.current_word
                    .push(WordPart::DoubleQuoted(std::mem::take(&mut self.buffer)));
                self.state = LexingState::ReadingWord;
            }
            c => self.buffer.push(c),
        }
    }

    fn flush_unquoted(&mut self) {
        if !self.buffer.is_empty() {
            self.current_word
                .push(WordPart::Unquoted(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        self.flush_unquoted();
        if !self.current_word.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.current_word)));
        }
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_char),
        _ => false,
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits `name=value` off a word whose first part is unquoted.
///
/// The value must be non-empty text or a quoted part; `x=''` assigns the empty
/// string while a bare `x=` stays an ordinary word.
fn split_assignment(parts: &[WordPart]) -> Option<(String, Vec<WordPart>)> {
    let (first, rest) = parts.split_first()?;
    let WordPart::Unquoted(text) = first else {
        return None;
    };
    let (name, head) = text.split_once('=')?;
    if !is_identifier(name) {
        return None;
    }

    // `x= 15` has nothing glued to `=`, so it is not an assignment
    if head.is_empty() && rest.is_empty() {
        return None;
    }

    let mut value = Vec::with_capacity(parts.len());
    if !head.is_empty() {
        value.push(WordPart::Unquoted(head.to_string()));
    }
    value.extend(rest.iter().cloned());
    Some((name.to_string(), value))
}

/// Turns the leading `name=value` words of every stage into `Token::Assignment`.
fn mark_assignments(tokens: Vec<Token>) -> Vec<Token> {
    let mut at_stage_start = true;
    tokens
        .into_iter()
        .map(|token| match token {
            Token::PipeOp => {
                at_stage_start = true;
                Token::PipeOp
            }
            Token::Word(parts) if at_stage_start => match split_assignment(&parts) {
                Some((name, value)) => Token::Assignment { name, value },
                None => {
                    at_stage_start = false;
                    Token::Word(parts)
                }
            },
            other => {
                at_stage_start = false;
                other
            }
        })
        .collect()
}

/// The main entry point function to perform lexical analysis.
///
/// Splits `line` on whitespace outside quotes and on unquoted `|`. A blank line
/// yields no tokens. An unclosed `'` or `"` fails the whole line.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    let tokens = lexer.make_tokens()?;
    Ok(mark_assignments(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unquoted(s: &str) -> WordPart {
        WordPart::Unquoted(s.to_string())
    }

    fn word(s: &str) -> Token {
        Token::Word(vec![unquoted(s)])
    }

    #[test]
    fn test_whitespace_collapses() {
        let tokens = split_into_tokens("echo   1    2\t 3").unwrap();
        assert_eq!(tokens, vec![word("echo"), word("1"), word("2"), word("3")]);
    }

    #[test]
    fn test_blank_line_has_no_tokens() {
        assert!(split_into_tokens("").unwrap().is_empty());
        assert!(split_into_tokens("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_quotes_are_verbatim() {
        let tokens = split_into_tokens(r#"echo 'a  "b"  c' "x  'y'  z""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                word("echo"),
                Token::Word(vec![WordPart::SingleQuoted(r#"a  "b"  c"#.to_string())]),
                Token::Word(vec![WordPart::DoubleQuoted("x  'y'  z".to_string())]),
            ]
        );
    }

    #[test]
    fn test_adjacent_parts_form_one_word() {
        let tokens = split_into_tokens(r#"a"b c"'$d'"#).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Word(vec![
                unquoted("a"),
                WordPart::DoubleQuoted("b c".to_string()),
                WordPart::SingleQuoted("$d".to_string()),
            ])]
        );
    }

    #[test]
    fn test_empty_quotes_make_an_empty_word() {
        let tokens = split_into_tokens("echo ''").unwrap();
        assert_eq!(
            tokens,
            vec![word("echo"), Token::Word(vec![WordPart::SingleQuoted(String::new())])]
        );
    }

    #[test]
    fn test_unmatched_quote() {
        assert_eq!(
            split_into_tokens("echo 'abc"),
            Err(LexingError::UnfinishedQuote)
        );
        assert_eq!(
            split_into_tokens("echo \"abc"),
            Err(LexingError::UnfinishedQuote)
        );
    }

    #[test]
    fn test_pipe_splits_words() {
        let tokens = split_into_tokens("echo 1|wc").unwrap();
        assert_eq!(tokens, vec![word("echo"), word("1"), Token::PipeOp, word("wc")]);

        let quoted = split_into_tokens("echo '|'").unwrap();
        assert_eq!(
            quoted,
            vec![word("echo"), Token::Word(vec![WordPart::SingleQuoted("|".to_string())])]
        );
    }

    #[test]
    fn test_assignments_at_stage_start() {
        let tokens = split_into_tokens(r#"x=15 t="test" echo y=1 | z= wc"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Assignment {
                    name: "x".to_string(),
                    value: vec![unquoted("15")],
                },
                Token::Assignment {
                    name: "t".to_string(),
                    value: vec![WordPart::DoubleQuoted("test".to_string())],
                },
                word("echo"),
                word("y=1"),
                Token::PipeOp,
                word("z="),
                word("wc"),
            ]
        );
    }

    #[test]
    fn test_invalid_assignment_names_stay_words() {
        let tokens = split_into_tokens("1x=3 =5").unwrap();
        assert_eq!(tokens, vec![word("1x=3"), word("=5")]);

        let quoted = split_into_tokens("'x'=1").unwrap();
        assert!(matches!(quoted[0], Token::Word(_)));
    }

    #[test]
    fn test_bare_equals_is_not_an_assignment() {
        let tokens = split_into_tokens("x= 15").unwrap();
        assert_eq!(tokens, vec![word("x="), word("15")]);

        let empty = split_into_tokens("x='' echo").unwrap();
        assert_eq!(
            empty[0],
            Token::Assignment {
                name: "x".to_string(),
                value: vec![WordPart::SingleQuoted(String::new())],
            }
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_a1"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}

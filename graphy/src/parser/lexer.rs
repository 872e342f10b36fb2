//! Tokeniser for the GraphQL query language.

use std::fmt;

use crate::position::{SourcePosition, Spanning};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    String(String),
    CurlyOpen,
    CurlyClose,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    Colon,
    Equals,
    At,
    Dollar,
    Ellipsis,
    ExclamationMark,
    EndOfFile,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(n) => write!(f, "{n}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::String(s) => write!(f, "{s:?}"),
            Token::CurlyOpen => write!(f, "{{"),
            Token::CurlyClose => write!(f, "}}"),
            Token::ParenOpen => write!(f, "("),
            Token::ParenClose => write!(f, ")"),
            Token::BracketOpen => write!(f, "["),
            Token::BracketClose => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Equals => write!(f, "="),
            Token::At => write!(f, "@"),
            Token::Dollar => write!(f, "$"),
            Token::Ellipsis => write!(f, "..."),
            Token::ExclamationMark => write!(f, "!"),
            Token::EndOfFile => write!(f, "<EOF>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unknown escape sequence in string literal")]
    UnknownEscapeSequence,
    #[error("unexpected character {0:?}")]
    UnknownCharacter(char),
    #[error("unterminated block string literal")]
    UnterminatedBlockString,
    #[error("invalid number literal")]
    InvalidNumber,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: SourcePosition,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source,
            chars: source.chars().collect(),
            pos: SourcePosition::new(0, 0, 0),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos.index()).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos.index() + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        if c == '\n' {
            self.pos.advance_newline();
        } else {
            self.pos.advance_col();
        }
        Some(c)
    }

    fn skip_ignored(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('\u{FEFF}') => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Spanning<Token>, Spanning<LexerError>> {
        self.skip_ignored();
        let start = self.pos.clone();

        let Some(c) = self.peek_char() else {
            return Ok(Spanning::start_end(&start, &start, Token::EndOfFile));
        };

        let tok = match c {
            '{' => {
                self.bump();
                Token::CurlyOpen
            }
            '}' => {
                self.bump();
                Token::CurlyClose
            }
            '(' => {
                self.bump();
                Token::ParenOpen
            }
            ')' => {
                self.bump();
                Token::ParenClose
            }
            '[' => {
                self.bump();
                Token::BracketOpen
            }
            ']' => {
                self.bump();
                Token::BracketClose
            }
            ':' => {
                self.bump();
                Token::Colon
            }
            '=' => {
                self.bump();
                Token::Equals
            }
            '@' => {
                self.bump();
                Token::At
            }
            '$' => {
                self.bump();
                Token::Dollar
            }
            '!' => {
                self.bump();
                Token::ExclamationMark
            }
            '.' => {
                if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                    self.bump();
                    self.bump();
                    self.bump();
                    Token::Ellipsis
                } else {
                    return Err(Spanning::zero_width(&start, LexerError::UnknownCharacter('.')));
                }
            }
            '"' => return self.scan_string(start),
            c if c == '_' || c.is_ascii_alphabetic() => self.scan_name(),
            c if c == '-' || c.is_ascii_digit() => return self.scan_number(start),
            other => {
                return Err(Spanning::zero_width(&start, LexerError::UnknownCharacter(other)));
            }
        };

        Ok(Spanning::start_end(&start, &self.pos.clone(), tok))
    }

    fn scan_name(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::Name(name)
    }

    fn scan_number(
        &mut self,
        start: SourcePosition,
    ) -> Result<Spanning<Token>, Spanning<LexerError>> {
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            text.push('-');
            self.bump();
        }

        match self.peek_char() {
            Some('0') => {
                text.push('0');
                self.bump();
            }
            Some(c) if c.is_ascii_digit() => {
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            _ => return Err(Spanning::zero_width(&start, LexerError::InvalidNumber)),
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            text.push('e');
            self.bump();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                text.push(self.peek_char().unwrap());
                self.bump();
            }
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        let tok = if is_float {
            Token::Float(text.parse().map_err(|_| Spanning::zero_width(&start, LexerError::InvalidNumber))?)
        } else {
            Token::Int(text.parse().map_err(|_| Spanning::zero_width(&start, LexerError::InvalidNumber))?)
        };

        Ok(Spanning::start_end(&start, &self.pos.clone(), tok))
    }

    fn scan_string(
        &mut self,
        start: SourcePosition,
    ) -> Result<Spanning<Token>, Spanning<LexerError>> {
        self.bump();

        if self.peek_char() == Some('"') && self.peek_at(1) == Some('"') {
            self.bump();
            self.bump();
            return self.scan_block_string(start);
        }

        let mut value = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(Spanning::zero_width(&start, LexerError::UnterminatedString))
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('/') => value.push('/'),
                        Some('b') => value.push('\u{8}'),
                        Some('f') => value.push('\u{c}'),
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('u') => {
                            let mut code = String::with_capacity(4);
                            for _ in 0..4 {
                                code.push(self.bump().ok_or_else(|| {
                                    Spanning::zero_width(&start, LexerError::UnterminatedString)
                                })?);
                            }
                            let scalar = u32::from_str_radix(&code, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    Spanning::zero_width(&start, LexerError::UnknownEscapeSequence)
                                })?;
                            value.push(scalar);
                        }
                        _ => return Err(Spanning::zero_width(&start, LexerError::UnknownEscapeSequence)),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }

        Ok(Spanning::start_end(&start, &self.pos.clone(), Token::String(value)))
    }

    fn scan_block_string(
        &mut self,
        start: SourcePosition,
    ) -> Result<Spanning<Token>, Spanning<LexerError>> {
        let mut raw = String::new();
        loop {
            if self.peek_char() == Some('"') && self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                self.bump();
                self.bump();
                self.bump();
                break;
            }
            match self.bump() {
                Some(c) => raw.push(c),
                None => return Err(Spanning::zero_width(&start, LexerError::UnterminatedBlockString)),
            }
        }
        Ok(Spanning::start_end(&start, &self.pos.clone(), Token::String(dedent_block_string(&raw))))
    }
}

/// Implements the GraphQL spec's `BlockStringValue` algorithm: strips the
/// common leading whitespace from every non-first line and trims blank
/// leading/trailing lines.
fn dedent_block_string(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.split('\n').collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min();

    if let Some(indent) = common_indent {
        for line in lines.iter_mut().skip(1) {
            if line.len() >= indent {
                *line = &line[indent..];
            }
        }
    }

    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap().item;
            let done = tok == Token::EndOfFile;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn tokenises_punctuation_and_names() {
        assert_eq!(
            tokens("{ field(arg: $x) }"),
            vec![
                Token::CurlyOpen,
                Token::Name("field".into()),
                Token::ParenOpen,
                Token::Name("arg".into()),
                Token::Colon,
                Token::Dollar,
                Token::Name("x".into()),
                Token::ParenClose,
                Token::CurlyClose,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn tokenises_numbers() {
        assert_eq!(tokens("42"), vec![Token::Int(42), Token::EndOfFile]);
        assert_eq!(tokens("-3.5e1"), vec![Token::Float(-35.0), Token::EndOfFile]);
    }

    #[test]
    fn tokenises_escaped_strings() {
        assert_eq!(
            tokens(r#""a\nb""#),
            vec![Token::String("a\nb".into()), Token::EndOfFile]
        );
    }

    #[test]
    fn dedents_block_strings() {
        let src = "\"\"\"\n    line one\n    line two\n    \"\"\"";
        assert_eq!(
            tokens(src),
            vec![Token::String("line one\nline two".into()), Token::EndOfFile]
        );
    }

    #[test]
    fn skips_comments_and_commas() {
        assert_eq!(
            tokens("# a comment\n{ , a , }"),
            vec![
                Token::CurlyOpen,
                Token::Name("a".into()),
                Token::CurlyClose,
                Token::EndOfFile,
            ]
        );
    }
}

//! A small single-token-lookahead parser over the GraphQL token stream.

use crate::parser::lexer::{Lexer, LexerError, Token};
use crate::position::{SourcePosition, Spanning};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    LexerError(#[from] LexerError),
    #[error("unexpected token {0}")]
    UnexpectedToken(Token),
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: Token },
}

pub type ParseResult<T> = Result<Spanning<T>, Spanning<ParseError>>;
pub type UnlocatedParseResult<T> = Result<T, Spanning<ParseError>>;
pub type OptionParseResult<T> = Result<Option<Spanning<T>>, Spanning<ParseError>>;

pub struct Parser<'a> {
    tokens: Vec<Spanning<Token>>,
    position: usize,
    _source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Parser<'a>, Spanning<ParseError>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token().map_err(|e| e.map(ParseError::from))?;
            let done = tok.item == Token::EndOfFile;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(Parser { tokens, position: 0, _source: source })
    }

    pub fn peek(&self) -> &Spanning<Token> {
        &self.tokens[self.position]
    }

    pub fn next(&mut self) -> Spanning<Token> {
        let tok = self.tokens[self.position].clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        tok
    }

    pub fn expect(&mut self, expected: &Token) -> ParseResult<Token> {
        if &self.peek().item == expected {
            Ok(self.next())
        } else {
            let found = self.next();
            Err(found.map(|t| ParseError::Expected {
                expected: expected.to_string(),
                found: t,
            }))
        }
    }

    pub fn skip(&mut self, expected: &Token) -> OptionParseResult<Token> {
        if &self.peek().item == expected {
            Ok(Some(self.next()))
        } else {
            Ok(None)
        }
    }

    pub fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek().item.clone() {
            Token::Name(_) => Ok(self.next().map(|t| match t {
                Token::Name(n) => n,
                _ => unreachable!(),
            })),
            _ => {
                let found = self.next();
                Err(found.map(|t| ParseError::Expected { expected: "name".into(), found: t }))
            }
        }
    }

    pub fn delimited_nonempty_list<T>(
        &mut self,
        open: &Token,
        parser: impl Fn(&mut Parser<'a>) -> ParseResult<T>,
        close: &Token,
    ) -> ParseResult<Vec<Spanning<T>>> {
        let Spanning { start, .. } = self.expect(open)?;
        let mut items = vec![parser(self)?];
        while &self.peek().item != close {
            items.push(parser(self)?);
        }
        let Spanning { end, .. } = self.expect(close)?;
        Ok(Spanning::start_end(&start, &end, items))
    }

    /// Like [`Parser::delimited_nonempty_list`] but tolerates zero items
    /// (GraphQL list literals and selection sets of size zero are invalid,
    /// but value-lists such as `[]` are legal).
    pub fn delimited_nonempty_list_or_empty<T>(
        &mut self,
        open: &Token,
        parser: impl Fn(&mut Parser<'a>) -> ParseResult<T>,
        close: &Token,
    ) -> ParseResult<Vec<T>> {
        let Spanning { start, .. } = self.expect(open)?;
        let mut items = Vec::new();
        while &self.peek().item != close {
            items.push(parser(self)?.item);
        }
        let Spanning { end, .. } = self.expect(close)?;
        Ok(Spanning::start_end(&start, &end, items))
    }

    pub fn unlocated_delimited_nonempty_list<T>(
        &mut self,
        open: &Token,
        parser: impl Fn(&mut Parser<'a>) -> UnlocatedParseResult<T>,
        close: &Token,
    ) -> UnlocatedParseResult<Vec<T>> {
        self.expect(open)?;
        let mut items = vec![parser(self)?];
        while &self.peek().item != close {
            items.push(parser(self)?);
        }
        self.expect(close)?;
        Ok(items)
    }

    pub fn position(&self) -> SourcePosition {
        self.peek().start.clone()
    }
}

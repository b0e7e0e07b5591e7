//! Parser implementation for building the Abstract Syntax Tree.
//!
//! The parser pulls tokens one at a time from a [`TokenSource`] and keeps a
//! single token of lookahead. Each call to
//! [`Parser::next_top_level_form`] consumes exactly the tokens of one form.
//! Expressions are parsed by operator-precedence climbing over a per-parser
//! precedence table; everything else is recursive descent.

use tracing::{debug, warn};

use crate::{
    ast::ast::TopLevel,
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::{Lexer, TokenBuffer, TokenSource},
        tokens::{Token, TokenKind},
    },
    Position,
};

use super::{
    lookups::{create_token_lookups, PrecedenceLookup},
    toplevel::{parse_definition, parse_extern, parse_top_level_expr},
};

/// Deepest primary-expression nesting accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 256;

/// The main parser structure that maintains parsing state.
pub struct Parser<S: TokenSource> {
    /// Where tokens come from
    source: S,
    /// One token of lookahead
    current: Token,
    /// Tokens consumed so far, used to detect lack of progress on errors
    consumed: usize,
    /// Binary operator precedences
    precedence_lookup: PrecedenceLookup,
    /// Primary expressions currently being parsed
    depth: usize,
}

impl<S: TokenSource> Parser<S> {
    /// Creates a parser with the default operator table and primes the
    /// lookahead token.
    pub fn new(mut source: S) -> Self {
        let current = source.pull();
        let mut parser = Parser {
            source,
            current,
            consumed: 0,
            precedence_lookup: PrecedenceLookup::new(),
            depth: 0,
        };
        create_token_lookups(&mut parser);
        parser
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        let next = self.source.pull();
        self.consumed += 1;
        std::mem::replace(&mut self.current, next)
    }

    /// Returns the position of the current token.
    pub fn get_position(&self) -> Position {
        self.current.span.start.clone()
    }

    /// Builds an error pointing at the current token.
    pub fn error(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current.to_string(),
                message: message.to_string(),
            },
            self.get_position(),
        )
    }

    /// Consumes a token of the given kind or fails with `message`.
    pub fn expect(&mut self, expected_kind: TokenKind, message: &str) -> Result<Token, Error> {
        if self.current.kind != expected_kind {
            return Err(self.error(message));
        }

        Ok(self.advance())
    }

    /// Consumes the given operator character or fails with `message`.
    pub fn expect_operator(&mut self, op: char, message: &str) -> Result<Token, Error> {
        if !self.current.is_operator(op) {
            return Err(self.error(message));
        }

        Ok(self.advance())
    }

    /// Consumes an identifier and returns its name.
    pub fn expect_identifier(&mut self, message: &str) -> Result<String, Error> {
        let token = self.expect(TokenKind::Identifier, message)?;
        Ok(token.text().to_string())
    }

    /// Enters one level of expression nesting, failing once the nesting
    /// passes [`MAX_NESTING_DEPTH`]. Pair with [`Parser::leave_nesting`].
    pub fn enter_nesting(&mut self) -> Result<(), Error> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Registers (or re-ranks) a binary operator.
    ///
    /// Only operators with a positive precedence take part in expression
    /// parsing.
    pub fn binary_op(&mut self, op: char, precedence: i32) {
        self.precedence_lookup.insert(op, precedence);
    }

    pub fn get_precedence_lookup(&self) -> &PrecedenceLookup {
        &self.precedence_lookup
    }

    /// The binary operator under the cursor and its precedence, if the
    /// current token is a registered operator.
    pub fn token_precedence(&self) -> Option<(char, i32)> {
        let op = self.current.as_operator()?;
        match self.precedence_lookup.get(&op) {
            Some(precedence) if *precedence > 0 => Some((op, *precedence)),
            _ => None,
        }
    }

    /// Parses the next top-level form.
    ///
    /// Returns `Ok(None)` once the token source is exhausted. On error the
    /// parser has already skipped ahead to the next form boundary, so the
    /// caller can simply call again.
    pub fn next_top_level_form(&mut self) -> Result<Option<TopLevel>, Error> {
        loop {
            let start = self.consumed;
            self.depth = 0;

            let result = match self.current.kind {
                TokenKind::EOF => return Ok(None),
                TokenKind::Operator if self.current.is_operator(';') => {
                    self.advance();
                    continue;
                }
                TokenKind::Def => parse_definition(self).map(TopLevel::Definition),
                TokenKind::Extern => parse_extern(self).map(TopLevel::Extern),
                _ => parse_top_level_expr(self).map(TopLevel::Definition),
            };

            return match result {
                Ok(item) => {
                    debug!(form = %item, "parsed top-level form");
                    Ok(Some(item))
                }
                Err(error) => {
                    warn!(%error, "discarding malformed top-level form");
                    self.synchronize(start);
                    Err(error)
                }
            };
        }
    }

    /// Drops the rest of a malformed form: at least one token, then
    /// everything up to the next `;`, `def`, `extern` or end of input.
    fn synchronize(&mut self, start: usize) {
        if self.consumed == start && self.current.kind != TokenKind::EOF {
            self.advance();
        }

        loop {
            match self.current.kind {
                TokenKind::EOF | TokenKind::Def | TokenKind::Extern => return,
                TokenKind::Operator if self.current.is_operator(';') => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parses every remaining form, collecting the forms and the errors.
    pub fn parse_program(&mut self) -> (Vec<TopLevel>, Vec<Error>) {
        let mut items = vec![];
        let mut errors = vec![];

        loop {
            match self.next_top_level_form() {
                Ok(Some(item)) => items.push(item),
                Ok(None) => return (items, errors),
                Err(error) => errors.push(error),
            }
        }
    }
}

/// Parses a stream of already-lexed tokens into top-level forms.
pub fn parse(tokens: Vec<Token>) -> (Vec<TopLevel>, Vec<Error>) {
    Parser::new(TokenBuffer::new(tokens)).parse_program()
}

/// Lexes and parses `source` in one go.
pub fn parse_source(source: &str, file: Option<String>) -> (Vec<TopLevel>, Vec<Error>) {
    Parser::new(Lexer::new(source, file)).parse_program()
}

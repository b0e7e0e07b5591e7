use std::{collections::VecDeque, rc::Rc};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{Span, MK_SPAN, MK_TOKEN};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

/// Produces a token from matched text, or `None` when the text is skipped.
pub type RegexHandler = fn(&Lexer, String, usize) -> Option<Token>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Tried in order; every pattern is anchored at the cursor and the last
    // one accepts any single character, so some pattern always matches.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^#[^\n\r]*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^[A-Za-z][A-Za-z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new(r"^[0-9.]+").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new(r"^.").unwrap(), handler: operator_handler },
    ];
}

/// The pull side of tokenisation.
///
/// Once the input is exhausted every call returns an `EOF` token.
pub trait TokenSource {
    fn pull(&mut self) -> Token;
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    fn pull(&mut self) -> Token {
        (**self).pull()
    }
}

impl<S: TokenSource + ?Sized> TokenSource for Box<S> {
    fn pull(&mut self) -> Token {
        (**self).pull()
    }
}

/// Scans source text on demand, one token per [`TokenSource::pull`].
#[derive(Clone)]
pub struct Lexer {
    source: String,
    pos: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: impl Into<String>, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            source: source.into(),
            pos: 0,
            file: file_name,
        }
    }

    pub fn file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            if self.at_eof() {
                return MK_TOKEN!(TokenKind::EOF, None, MK_SPAN!(self.pos, 0, self.file));
            }

            let remainder = self.remainder();
            let matched = PATTERNS.iter().find_map(|pattern| {
                pattern
                    .regex
                    .find(remainder)
                    .map(|found| (pattern.handler, found.as_str().to_string()))
            });

            let (handler, text) = match matched {
                Some(found) => found,
                None => {
                    // `^.` leaves only `\n`, which `^\s+` already covers.
                    let skipped = remainder.chars().next().map_or(1, char::len_utf8);
                    self.pos += skipped;
                    continue;
                }
            };

            let start = self.pos;
            self.pos += text.len();

            if let Some(token) = handler(&*self, text, start) {
                return token;
            }
        }
    }
}

impl TokenSource for Lexer {
    fn pull(&mut self) -> Token {
        self.next_token()
    }
}

fn skip_handler(_lexer: &Lexer, _text: String, _start: usize) -> Option<Token> {
    None
}

fn symbol_handler(lexer: &Lexer, text: String, start: usize) -> Option<Token> {
    let span = MK_SPAN!(start, text.len(), lexer.file);

    if let Some(kind) = RESERVED_LOOKUP.get(text.as_str()) {
        Some(MK_TOKEN!(*kind, None, span))
    } else {
        Some(MK_TOKEN!(TokenKind::Identifier, Some(text), span))
    }
}

fn number_handler(lexer: &Lexer, text: String, start: usize) -> Option<Token> {
    let span = MK_SPAN!(start, text.len(), lexer.file);
    Some(MK_TOKEN!(TokenKind::Number, Some(text), span))
}

fn operator_handler(lexer: &Lexer, text: String, start: usize) -> Option<Token> {
    let span = MK_SPAN!(start, text.len(), lexer.file);
    Some(MK_TOKEN!(TokenKind::Operator, Some(text), span))
}

/// A [`TokenSource`] over tokens that were already produced.
///
/// Tokens are handed out in order; afterwards the trailing `EOF` token (or
/// a synthetic one) is repeated forever.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: VecDeque<Token>,
    eof: Token,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: VecDeque<Token> = tokens.into();
        let eof = match tokens.iter().position(|token| token.kind == TokenKind::EOF) {
            Some(index) => {
                let eof = tokens[index].clone();
                tokens.truncate(index);
                eof
            }
            None => MK_TOKEN!(TokenKind::EOF, None, Span::null()),
        };

        TokenBuffer { tokens, eof }
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

impl TokenSource for TokenBuffer {
    fn pull(&mut self) -> Token {
        self.tokens.pop_front().unwrap_or_else(|| self.eof.clone())
    }
}

/// Scans the whole source; the result ends with exactly one `EOF` token.
pub fn tokenize(source: impl Into<String>, file: Option<String>) -> Vec<Token> {
    let mut lex = Lexer::new(source, file);
    let mut tokens = vec![];

    loop {
        let token = lex.next_token();
        let done = token.kind == TokenKind::EOF;
        tokens.push(token);

        if done {
            return tokens;
        }
    }
}

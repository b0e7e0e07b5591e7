use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("def", TokenKind::Def);
        map.insert("extern", TokenKind::Extern);
        map.insert("if", TokenKind::If);
        map.insert("then", TokenKind::Then);
        map.insert("else", TokenKind::Else);
        map.insert("for", TokenKind::For);
        map.insert("in", TokenKind::In);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,

    // Reserved
    Def,
    Extern,
    If,
    Then,
    Else,
    For,
    In,

    Identifier,
    Number,
    /// Any other single character: arithmetic, parentheses, `,`, `;`, `=`.
    Operator,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        RESERVED_LOOKUP.values().any(|kind| kind == self)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexed token.
///
/// Keywords and `EOF` carry no text. Equality compares `kind` and `value`
/// only; the span is bookkeeping for diagnostics.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<String>,
    pub span: Span,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.value) {
            (TokenKind::EOF, _) => write!(f, "<eof>"),
            (_, Some(value)) => write!(f, "{}", value),
            (kind, None) => match RESERVED_LOOKUP.iter().find(|(_, k)| *k == kind) {
                Some((word, _)) => write!(f, "{}", word),
                None => write!(f, "{}", kind),
            },
        }
    }
}

impl Token {
    /// Builds a token with no source position.
    pub fn new(kind: TokenKind, value: Option<&str>) -> Self {
        Token {
            kind,
            value: value.map(String::from),
            span: Span::null(),
        }
    }

    pub fn eof() -> Self {
        Token::new(TokenKind::EOF, None)
    }

    pub fn identifier(name: &str) -> Self {
        Token::new(TokenKind::Identifier, Some(name))
    }

    pub fn number(text: &str) -> Self {
        Token::new(TokenKind::Number, Some(text))
    }

    pub fn operator(op: char) -> Self {
        Token {
            kind: TokenKind::Operator,
            value: Some(op.to_string()),
            span: Span::null(),
        }
    }

    /// The token text, or an empty string for keywords and `EOF`.
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// The operator character, if this is an operator token.
    pub fn as_operator(&self) -> Option<char> {
        match self.kind {
            TokenKind::Operator => self.text().chars().next(),
            _ => None,
        }
    }

    pub fn is_operator(&self, op: char) -> bool {
        self.as_operator() == Some(op)
    }
}

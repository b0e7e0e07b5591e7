//! Lexical analysis.
//!
//! This module contains the token source consumed by the parser:
//!
//! - A pull-based, regex-driven scanner ([`lexer::Lexer`])
//! - A replayable buffer over pre-made tokens ([`lexer::TokenBuffer`])
//! - Keyword recognition through a reserved-word table
//! - `#` comments and whitespace, which never reach the parser

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;

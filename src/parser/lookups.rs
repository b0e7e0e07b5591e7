use std::collections::HashMap;

use crate::lexer::lexer::TokenSource;

use super::parser::Parser;

/// Binary operator precedences; higher binds tighter.
pub struct Precedence;

impl Precedence {
    pub const RELATIONAL: i32 = 10;
    pub const ADDITIVE: i32 = 20;
    pub const MULTIPLICATIVE: i32 = 40;
}

pub type PrecedenceLookup = HashMap<char, i32>;

pub fn create_token_lookups<S: TokenSource>(parser: &mut Parser<S>) {
    // Relational
    parser.binary_op('<', Precedence::RELATIONAL);

    // Additive and multiplicative
    parser.binary_op('+', Precedence::ADDITIVE);
    parser.binary_op('-', Precedence::ADDITIVE);
    parser.binary_op('*', Precedence::MULTIPLICATIVE);
}

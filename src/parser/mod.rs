//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into top-level forms. It handles:
//!
//! - Expression parsing by operator-precedence climbing
//! - Prototypes, definitions, externs and bare top-level expressions
//! - Error recovery, so one bad form does not stop the rest
//!
//! The operator table lives on the parser and can be extended at runtime
//! with [`parser::Parser::binary_op`].

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod toplevel;

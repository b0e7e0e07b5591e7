#![allow(clippy::module_inception)]

//! Front end for a small expression-oriented language.
//!
//! Source text is turned into tokens by the [`lexer`], into an AST by the
//! [`parser`], and lowered into SSA form by the [`compiler`] against any
//! [`ir::Backend`]. The built-in [`ir::Module`] backend can be verified,
//! optimised, printed and executed; an LLVM backend is available behind the
//! `llvm` feature.

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod ir;
pub mod lexer;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod macros;
pub mod parser;
pub mod session;

extern crate regex;

/// Byte offset into a named source.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }
}

/// Finds the line containing `position`.
///
/// Returns the 1-based line number, the line text and the offset of
/// `position` inside that line. An offset at the very end of the source
/// resolves to the last line.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos > source.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        start = end;
        line_number += 1;
    }

    // End of input: point just past the last character of the final line.
    if source.is_empty() || source.ends_with('\n') {
        return Some((line_number, String::new(), 0));
    }

    let last = source.rsplit('\n').next().unwrap_or("");
    Some((line_number - 1, last.to_string(), last.len()))
}

/// Renders an error the way it is shown to a user:
///
/// ```text
/// Error: ExpectedExpression (Unexpected token: `)`, expected an expression)
/// -> test.hls
///   |
/// 1 | def f(a) a + )
///   | -------------^
/// ```
///
/// Errors without a position (most lowering errors) render as the first line
/// only.
pub fn render_error(error: &Error, source: &str) -> String {
    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }

    let position = match error.get_position() {
        Some(position) => position,
        None => return out,
    };

    let (line, line_text, line_pos) = match get_line_at_position(source, position.0) {
        Some(found) => found,
        None => return out,
    };

    let line_str = line.to_string();
    let padding = line_str.len() + 2;

    out.push_str(&format!("-> {}\n", position.1));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_str, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (String::from(&string[start..]), start)
}

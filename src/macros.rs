//! Utility macros for the front end.
//!
//! - `MK_TOKEN!` - Creates a Token instance with a source span
//! - `MK_SPAN!` - Creates a Span covering a byte range of a named source

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's optional text
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, Some("42".to_string()), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        $crate::lexer::tokens::Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a Span from a start offset, a length and a shared file name.
///
/// # Example
///
/// ```ignore
/// let span = MK_SPAN!(lexer.pos, matched.len(), lexer.file);
/// ```
#[macro_export]
macro_rules! MK_SPAN {
    ($start:expr, $len:expr, $file:expr) => {
        $crate::Span {
            start: $crate::Position($start as u32, ::std::rc::Rc::clone(&$file)),
            end: $crate::Position(($start + $len) as u32, ::std::rc::Rc::clone(&$file)),
        }
    };
}
